/*!
* 以 replica 的身份连接到一个 Redis 兼容的 master：完成复制握手，接收一份 RDB 快照，
* 然后持续跟随 master 写入的命令流，通过统一的事件接口把两者都交给调用方，并把确认过的
* 复制偏移量回报给 master，让它把这个进程当成一个健康的 replica。
*
* # 原理
*
* 连接建立后，master 会把当前数据集整体 dump 成 RDB 格式发送过来，这份 RDB 里的每一条
* 记录都会变成一个或一组 [`Event`]；RDB 传输结束后，master 对数据集的每一次写入都会继续
* 通过同一条连接转发过来，变成 [`Event::Command`]。
*
* # 示例
*
* ```no_run
* use std::net::{SocketAddr};
* use std::str::FromStr;
* use std::sync::atomic::AtomicBool;
* use std::sync::Arc;
* use std::rc::Rc;
* use std::cell::RefCell;
* use redis_repl_event::listener;
* use redis_repl_event::config::Config;
* use redis_repl_event::{NoOpEventHandler, RedisListener};
*
* fn main() -> std::io::Result<()> {
*     let conf = Config::new(SocketAddr::from_str("127.0.0.1:6379").unwrap());
*     let running = Arc::new(AtomicBool::new(true));
*
*     let mut redis_listener = listener::Builder::new()
*         .with_config(conf)
*         .with_control_flag(running)
*         .with_event_handler(Rc::new(RefCell::new(NoOpEventHandler {})))
*         .build()?;
*
*     redis_listener.start()?;
*     Ok(())
* }
* ```
*
* [`Event`]: enum.Event.html
*/

use std::io::Read;

pub use crate::error::{RedisEventError, Result};

use crate::cmd::Command;

pub mod cmd;
pub mod config;
pub mod crc64;
mod error;
mod io;
mod iter;
pub mod listener;
mod lzf;
pub mod rdb;
pub mod resp;

/// 所有类型的监听器都实现此接口。
pub trait RedisListener {
    /// 开启事件监听，阻塞直到会话结束（出错，或者控制标志被清除）。
    fn start(&mut self) -> Result<()>;
}

/// RDB 解析器：把一段 RDB 字节流翻译成 [`Event`] 序列。
pub trait RDBParser {
    /// * `input`: RDB 输入流，恰好定界到 RDB 的末尾（不会多读）
    /// * `length`: RDB 的总长度，-1 表示长度未知（例如独立的 dump 文件）
    /// * `event_handler`: 接收翻译出的事件
    fn parse(&mut self, input: &mut dyn Read, length: i64, event_handler: &mut dyn EventHandler) -> Result<()>;
}

/// 统一的事件类型：RDB 快照的生命周期事件、以及 tailing 阶段收到的命令。
///
/// 不像早期版本那样为每一类数据结构分别暴露一个回调方法——所有事件经由同一个
/// [`EventHandler::handle`] 方法投递，调用方在一个 `match` 里处理自己关心的分支即可。
#[derive(Debug)]
pub enum Event<'a> {
    BeginRdb,
    EndRdb,
    BeginDatabase(u32),
    EndDatabase(u32),
    Aux { key: Vec<u8>, value: Vec<u8> },
    ResizeDb { db_size: u64, expires_size: u64 },

    Set { key: Vec<u8>, value: Vec<u8>, expire_at_ms: Option<i64> },

    BeginHash { key: Vec<u8>, length: i64, expire_at_ms: Option<i64> },
    Hset { key: Vec<u8>, field: Vec<u8>, value: Vec<u8> },
    EndHash { key: Vec<u8> },

    BeginSet { key: Vec<u8>, cardinality: i64, expire_at_ms: Option<i64> },
    Sadd { key: Vec<u8>, member: Vec<u8> },
    EndSet { key: Vec<u8> },

    BeginList { key: Vec<u8>, length: i64, expire_at_ms: Option<i64> },
    Rpush { key: Vec<u8>, value: Vec<u8> },
    EndList { key: Vec<u8> },

    BeginZSet { key: Vec<u8>, cardinality: i64, expire_at_ms: Option<i64> },
    Zadd { key: Vec<u8>, score: f64, member: Vec<u8> },
    EndZSet { key: Vec<u8> },

    BeginStream { key: Vec<u8>, cardinality: i64, expire_at_ms: Option<i64> },
    Xadd { key: Vec<u8>, id: String, fields_blob: Vec<u8> },
    EndStream { key: Vec<u8> },

    /// tailing 阶段，从 master 收到的一条写命令。
    Command(Command<'a>),
}

/// 所有类型的事件处理器都必须实现此接口。
pub trait EventHandler {
    fn handle(&mut self, event: Event);
}

/// 不对收到的事件做任何处理，仅用于占位或测试。
pub struct NoOpEventHandler {}

impl EventHandler for NoOpEventHandler {
    fn handle(&mut self, _: Event) {}
}

/// 转换为 utf-8 字符串，不校验合法性——RDB/RESP 里的字符串本质是字节串，
/// 但绝大多数调用方期望拿到 `String`。
pub(crate) fn to_string(bytes: Vec<u8>) -> String {
    unsafe { String::from_utf8_unchecked(bytes) }
}
