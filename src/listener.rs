/*!
 复制驱动：完成握手、PSYNC、接收 RDB、然后持续 tailing 命令流。状态机大致是
 `DIAL -> HANDSHAKE -> PSYNC_SENT -> RDB_TRANSFER -> TAILING`，`+CONTINUE` 部分重同步
 直接从 PSYNC_SENT 跳进 TAILING，不经过 RDB_TRANSFER。

 # 示例

 ```no_run
 use std::net::SocketAddr;
 use std::str::FromStr;
 use std::sync::atomic::AtomicBool;
 use std::sync::Arc;
 use std::rc::Rc;
 use std::cell::RefCell;
 use redis_repl_event::listener;
 use redis_repl_event::config::Config;
 use redis_repl_event::{NoOpEventHandler, RedisListener};

 let conf = Config::new(SocketAddr::from_str("127.0.0.1:6379").unwrap());
 let running = Arc::new(AtomicBool::new(true));

 let mut redis_listener = listener::Builder::new()
     .with_config(conf)
     .with_control_flag(running)
     .with_event_handler(Rc::new(RefCell::new(NoOpEventHandler {})))
     .build()
     .unwrap();

 redis_listener.start().unwrap();
 ```
*/
use std::cell::RefCell;
use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpStream};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::thread::sleep;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::Config;
use crate::error::{RedisEventError, Result};
use crate::io;
use crate::rdb::DefaultRDBParser;
use crate::resp::{self, RespValue};
use crate::{cmd, to_string, EventHandler, NoOpEventHandler, RDBParser, RedisListener};

/// 5 秒的 PSYNC 重试间隔，对应 `NOMASTERLINK` / `LOADING` 回复。
const SYNC_RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// ACK 心跳的发送间隔。
const ACK_INTERVAL: Duration = Duration::from_secs(1);

/// 构建 [`Listener`] 的 builder。地址是唯一必填项（经由 [`Config`] 携带），其余字段
/// 都有合理的默认值。
///
/// [`Listener`]: struct.Listener.html
/// [`Config`]: ../config/struct.Config.html
#[derive(Default)]
pub struct Builder {
    config: Option<Config>,
    running: Option<Arc<AtomicBool>>,
    event_handler: Option<Rc<RefCell<dyn EventHandler>>>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { config: None, running: None, event_handler: None }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_control_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn with_event_handler(mut self, handler: Rc<RefCell<dyn EventHandler>>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// 组装出一个可以调用 `start()` 的 [`Listener`]。
    ///
    /// 未调用 `with_config` 时返回 `InvalidArgument`：地址是唯一没有默认值的必填项，
    /// 调用方传了一个不完整的 builder，会话从未开始，不值得 panic。
    pub fn build(self) -> Result<Listener> {
        let config = self
            .config
            .ok_or_else(|| RedisEventError::invalid_argument("listener::Builder requires with_config before build()"))?;
        let running = self.running.unwrap_or_else(|| Arc::new(AtomicBool::new(true)));
        let event_handler = self.event_handler.unwrap_or_else(|| Rc::new(RefCell::new(NoOpEventHandler {})));
        let offset = Arc::new(AtomicI64::new(config.repl_offset));
        Ok(Listener {
            config,
            conn: None,
            event_handler,
            offset,
            mark: false,
            t_heartbeat: HeartbeatWorker { thread: None, stop: None },
            running,
        })
    }
}

/// 单个 Redis 实例的复制会话。
pub struct Listener {
    pub config: Config,
    conn: Option<Conn>,
    event_handler: Rc<RefCell<dyn EventHandler>>,
    /// 复制偏移量：handshake/RDB 阶段不计入，mark 置位后每一帧的字节数都原子地累加进来，
    /// 心跳线程原子地读取它拼进 ACK 帧。
    offset: Arc<AtomicI64>,
    /// true 表示已经观察到 FULLRESYNC（RDB 接收完毕后）或 CONTINUE，此后的字节计数才
    /// 计入 offset。
    mark: bool,
    t_heartbeat: HeartbeatWorker,
    running: Arc<AtomicBool>,
}

impl Listener {
    /// 允许在 `build()` 之后替换事件处理器。
    pub fn set_event_handler(&mut self, handler: Rc<RefCell<dyn EventHandler>>) {
        self.event_handler = handler;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn connect(&mut self) -> Result<()> {
        let reader = TcpStream::connect(self.config.addr)?;
        reader.set_read_timeout(self.config.read_timeout)?;
        reader.set_write_timeout(self.config.write_timeout)?;
        reader.set_nodelay(true)?;
        net2::TcpStreamExt::set_keepalive(&reader, Some(self.config.keepalive))?;
        info!("connected to master at {}", self.config.addr);

        #[cfg(feature = "tls")]
        {
            if self.config.tls_enabled {
                let mut builder = native_tls::TlsConnector::builder();
                if self.config.tls_insecure_skip_verify {
                    builder.danger_accept_invalid_certs(true);
                }
                if let Some(identity) = self.config.identity.clone() {
                    builder.identity(identity);
                }
                let connector =
                    builder.build().map_err(|e| RedisEventError::protocol(format!("tls setup failed: {}", e)))?;
                let server_name = self.config.addr.ip().to_string();
                let stream = connector
                    .connect(&server_name, reader)
                    .map_err(|e| RedisEventError::protocol(format!("tls handshake failed: {}", e)))?;
                self.conn = Some(Conn::Tls { shared: Arc::new(Mutex::new(stream)) });
                return Ok(());
            }
        }
        let writer = reader.try_clone()?;
        self.conn = Some(Conn::Plain { reader, writer });
        Ok(())
    }

    fn conn(&mut self) -> &mut Conn {
        self.conn.as_mut().expect("listener is not connected yet")
    }

    fn write_command(&mut self, name: &[u8], args: &[&[u8]]) -> Result<()> {
        self.conn().send(name, args)
    }

    /// 若配置了密码，在 REPLCONF 之前先做一次 AUTH；回复非 OK 会终止会话。
    fn auth(&mut self) -> Result<()> {
        if self.config.password.is_empty() {
            return Ok(());
        }
        self.write_command(b"AUTH", &[self.config.password.as_bytes()])?;
        match self.conn().read_value()? {
            RespValue::SimpleString(ref s) if s == b"OK" => Ok(()),
            other => Err(RedisEventError::protocol(format!("AUTH rejected by master: {:?}", other))),
        }
    }

    /// `REPLCONF listening-port/ip-address/capa eof/capa psync2`。一个非 OK 的回复只是
    /// 记一条 warn，不会中止握手——真正会中止会话的只有 I/O 错误。
    fn replconf(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_command(b"REPLCONF", &[key, value])?;
        match self.conn().read_value()? {
            RespValue::SimpleString(ref s) if s == b"OK" => {}
            other => warn!("REPLCONF {} got a non-OK reply: {:?}", String::from_utf8_lossy(key), other),
        }
        Ok(())
    }

    fn handshake(&mut self) -> Result<()> {
        let local_addr = self.conn().local_addr()?;
        self.replconf(b"listening-port", local_addr.port().to_string().as_bytes())?;
        self.replconf(b"ip-address", local_addr.ip().to_string().as_bytes())?;
        self.replconf(b"capa", b"eof")?;
        self.replconf(b"capa", b"psync2")?;
        Ok(())
    }

    /// 发送 PSYNC，按回复前缀分派；`NOMASTERLINK`/`LOADING` 返回 `Ok(false)` 让调用方
    /// 退避重试，其余情况返回 `Ok(true)` 表示已经进入 tailing 阶段。
    fn start_sync(&mut self) -> Result<bool> {
        let offset = self.config.repl_offset.to_string();
        let repl_id = self.config.repl_id.clone();
        self.write_command(b"PSYNC", &[repl_id.as_bytes(), offset.as_bytes()])?;
        let line = match self.conn().read_value()? {
            RespValue::SimpleString(bytes) => to_string(bytes),
            other => return Err(RedisEventError::protocol(format!("expected simple string PSYNC reply, got {:?}", other))),
        };
        if line.starts_with("FULLRESYNC") {
            info!("full resync: {}", line);
            let mut parts = line.split_whitespace();
            let repl_id = parts
                .nth(1)
                .ok_or_else(|| RedisEventError::protocol("FULLRESYNC missing replication id"))?
                .to_owned();
            let repl_offset: i64 = parts
                .next()
                .ok_or_else(|| RedisEventError::protocol("FULLRESYNC missing offset"))?
                .parse()
                .map_err(|_| RedisEventError::protocol("FULLRESYNC offset is not an integer"))?;
            self.receive_rdb(repl_id.clone(), repl_offset)?;
            self.config.repl_id = repl_id;
            self.config.repl_offset = repl_offset;
            self.offset.store(repl_offset, Ordering::SeqCst);
            self.mark = true;
            Ok(true)
        } else if line.starts_with("CONTINUE") {
            info!("partial resync accepted: {}", line);
            let mut parts = line.split_whitespace();
            if let Some(repl_id) = parts.nth(1) {
                if !repl_id.is_empty() && repl_id != self.config.repl_id {
                    self.config.repl_id = repl_id.to_owned();
                }
            }
            self.mark = true;
            Ok(true)
        } else if line.starts_with("NOMASTERLINK") {
            warn!("master has no link to its own master yet: {}", line);
            Ok(false)
        } else if line.starts_with("LOADING") {
            info!("master is still loading its dataset: {}", line);
            Ok(false)
        } else {
            warn!("master did not understand PSYNC ({:?}), falling back to SYNC", line);
            self.write_command(b"SYNC", &[])?;
            self.receive_rdb("?".to_string(), -1)?;
            self.mark = true;
            Ok(true)
        }
    }

    /// 读取 `$<len>\r\n` 的 RDB 传输头，然后把受限到 `length` 字节的流交给 RDB 解析器
    /// （或者在 `is_discard_rdb` 时直接丢弃）。无论哪种情况，结束之后都把受限读取器
    /// 剩余的字节吃空——EOF opcode 之后跟着的 8 字节 CRC64（capa eof 关闭时才有）落在
    /// 同一个 `$<len>` 区间内，解析器看到 EOF 就返回了，这里负责对齐到流的末尾。
    fn receive_rdb(&mut self, repl_id: String, repl_offset: i64) -> Result<()> {
        let header = self.conn().read_rdb_payload_header(repl_id, repl_offset)?;
        let length = match header {
            RespValue::RdbPayload { length, .. } => length,
            other => return Err(RedisEventError::protocol(format!("expected rdb payload header, got {:?}", other))),
        };
        let discard = self.config.is_discard_rdb;
        let handler = self.event_handler.clone();
        let running = self.running.clone();
        self.conn().with_reader(move |r| -> Result<()> {
            let mut bounded = r.take(length.max(0) as u64);
            if discard {
                io::skip(&mut bounded, length)?;
            } else {
                let mut parser = DefaultRDBParser { running };
                let mut guard = handler.borrow_mut();
                parser.parse(&mut bounded, length, &mut *guard)?;
                std::io::copy(&mut bounded, &mut std::io::sink())?;
            }
            Ok(())
        })
    }

    /// 读取 tailing 阶段的下一帧，返回解析出的值以及这一帧消耗的字节数（不论 mark
    /// 是否置位都会统计，是否累加进 offset 由调用方决定）。
    fn receive_frame(&mut self) -> Result<(RespValue, i64)> {
        self.conn().with_reader(|r| {
            let mut counted = io::CountReader::new(r);
            counted.mark();
            let value = resp::read_value(&mut counted)?;
            let n = counted.reset()?;
            Ok((value, n))
        })
    }

    /// tailing 阶段单帧分派。见模块头的状态机描述：数组变成一条命令喂给 sink；裸
    /// bulk string 只会是 PING 心跳，补偿它被拆掉的 `*1\r\n` 前缀；整数/错误/裸 CRLF
    /// 原样跳过；其它任何形状都是协议错误。
    fn dispatch_tailing(&mut self, value: RespValue) -> Result<()> {
        match value {
            RespValue::SimpleString(bytes) => {
                let text = to_string(bytes);
                if text.starts_with("CONTINUE") {
                    self.mark = true;
                    Ok(())
                } else {
                    Err(RedisEventError::protocol(format!("unexpected simple string during tailing: {}", text)))
                }
            }
            RespValue::Array(Some(values)) => {
                let data = array_to_tokens(values)?;
                let mut handler = self.event_handler.borrow_mut();
                cmd::parse(data, &mut *handler);
                Ok(())
            }
            RespValue::BulkString(Some(bytes)) if bytes.eq_ignore_ascii_case(b"PING") => {
                if self.mark {
                    // 这里的 +4 补的是master没有把PING包成`*1\r\n$4\r\nPING\r\n`这个数组形式，
                    // 而是直接发了一个裸 bulk string——缺的正是 `*1\r\n` 这 4 个字节，offset
                    // 的计算是按它本该是数组形式来算的。
                    self.offset.fetch_add(4, Ordering::SeqCst);
                }
                Ok(())
            }
            RespValue::Integer(_) | RespValue::Error(_) | RespValue::CrLf => Ok(()),
            other => Err(RedisEventError::protocol(format!("unexpected value during tailing: {:?}", other))),
        }
    }

    fn start_heartbeat(&mut self) {
        if !self.is_running() {
            return;
        }
        let mut writer = match self.conn().clone_writer() {
            Ok(w) => w,
            Err(err) => {
                error!("failed to obtain a writer for the ack ticker: {}", err);
                return;
            }
        };
        let offset = self.offset.clone();
        let running = self.running.clone();
        let (sender, receiver) = mpsc::channel::<()>();

        let t = thread::spawn(move || {
            info!("ack ticker started");
            loop {
                match receiver.recv_timeout(ACK_INTERVAL) {
                    Ok(()) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let current = offset.load(Ordering::SeqCst);
                if current < 0 {
                    continue;
                }
                if let Err(err) = writer.send_ack(current.to_string().as_bytes()) {
                    error!("ack ticker failed to write, stopping: {}", err);
                    break;
                }
            }
            info!("ack ticker stopped");
        });
        self.t_heartbeat = HeartbeatWorker { thread: Some(t), stop: Some(sender) };
    }
}

impl RedisListener for Listener {
    fn start(&mut self) -> Result<()> {
        self.connect()?;
        self.auth()?;
        self.handshake()?;
        while !self.start_sync()? {
            if !self.is_running() {
                return Ok(());
            }
            sleep(SYNC_RETRY_BACKOFF);
        }
        if !self.config.is_aof {
            return Ok(());
        }
        self.start_heartbeat();
        while self.is_running() {
            match self.receive_frame() {
                Ok((value, n)) => {
                    if self.mark {
                        self.offset.fetch_add(n, Ordering::SeqCst);
                        self.config.repl_offset = self.offset.load(Ordering::SeqCst);
                    }
                    self.dispatch_tailing(value)?;
                }
                Err(RedisEventError::Io(ref err))
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    // 读超时，连接本身没问题，回去继续等
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(stop) = self.t_heartbeat.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.t_heartbeat.thread.take() {
            let _ = thread.join();
        }
    }
}

fn array_to_tokens(values: Vec<RespValue>) -> Result<Vec<Vec<u8>>> {
    values
        .into_iter()
        .map(|v| match v {
            RespValue::BulkString(Some(b)) => Ok(b),
            other => {
                Err(RedisEventError::protocol(format!("expected bulk string token in command array, got {:?}", other)))
            }
        })
        .collect()
}

struct HeartbeatWorker {
    thread: Option<thread::JoinHandle<()>>,
    stop: Option<mpsc::Sender<()>>,
}

/// 连接的读写两端。Plain 情况下是一对各自独立的 `TcpStream` 克隆（读写互不阻塞）；
/// TLS 情况下 `TlsStream` 不能克隆，读写只能共享同一个对象，通过 `Mutex` 轮流访问——
/// 这意味着如果 `Config.read_timeout` 是 `None`，ACK ticker 可能被一次长时间的阻塞读
/// 卡住；启用 TLS 时建议搭配一个有限的 `read_timeout`。
enum Conn {
    Plain {
        reader: TcpStream,
        writer: TcpStream,
    },
    #[cfg(feature = "tls")]
    Tls {
        shared: Arc<Mutex<native_tls::TlsStream<TcpStream>>>,
    },
}

impl Conn {
    fn with_reader<T>(&mut self, f: impl FnOnce(&mut dyn Read) -> T) -> T {
        match self {
            Conn::Plain { reader, .. } => f(reader),
            #[cfg(feature = "tls")]
            Conn::Tls { shared } => {
                let mut guard = shared.lock().unwrap();
                f(&mut *guard)
            }
        }
    }

    fn read_value(&mut self) -> Result<RespValue> {
        self.with_reader(|r| Ok(resp::read_value(r)?))
    }

    fn read_rdb_payload_header(&mut self, replid: String, offset: i64) -> Result<RespValue> {
        self.with_reader(move |r| Ok(resp::read_rdb_payload_header(r, replid, offset)?))
    }

    fn send(&mut self, name: &[u8], args: &[&[u8]]) -> Result<()> {
        match self {
            Conn::Plain { writer, .. } => Ok(io::send(writer, name, args)?),
            #[cfg(feature = "tls")]
            Conn::Tls { shared } => {
                let mut guard = shared.lock().unwrap();
                Ok(io::send(&mut *guard, name, args)?)
            }
        }
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        match self {
            Conn::Plain { reader, .. } => Ok(reader.local_addr()?),
            #[cfg(feature = "tls")]
            Conn::Tls { shared } => Ok(shared.lock().unwrap().get_ref().local_addr()?),
        }
    }

    fn clone_writer(&self) -> Result<AckWriter> {
        match self {
            Conn::Plain { writer, .. } => Ok(AckWriter::Plain(writer.try_clone()?)),
            #[cfg(feature = "tls")]
            Conn::Tls { shared } => Ok(AckWriter::Tls(shared.clone())),
        }
    }
}

/// ACK ticker 线程持有的写入端，见 [`Conn`] 顶部注释里关于 Plain/TLS 区别的说明。
enum AckWriter {
    Plain(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Arc<Mutex<native_tls::TlsStream<TcpStream>>>),
}

impl AckWriter {
    fn send_ack(&mut self, offset: &[u8]) -> std::io::Result<()> {
        match self {
            AckWriter::Plain(w) => io::send(w, b"REPLCONF", &[b"ACK", offset]),
            #[cfg(feature = "tls")]
            AckWriter::Tls(shared) => {
                let mut guard = shared.lock().unwrap();
                io::send(&mut *guard, b"REPLCONF", &[b"ACK", offset])
            }
        }
    }
}
