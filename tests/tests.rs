//! 针对真实 `redis-server` 进程的集成测试：让它把数据 dump 成 RDB 发给我们的
//! `Listener`，或者在 tailing 阶段把写命令转发过来，断言翻译出的事件序列。
use std::cell::RefCell;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use redis::{Commands, ConnectionAddr};
use serial_test::serial;

use redis_repl_event::config::Config;
use redis_repl_event::{cmd, listener, rdb, Event, EventHandler, NoOpEventHandler, RedisListener};

mod support;
use support::TestContext;

/// 把感兴趣的事件压成一个和字段一一对应、可以 `assert_eq!` 的枚举。
#[derive(Debug, PartialEq, Clone)]
enum Trace {
    Aux(String, String),
    Set(String, String, bool),
    BeginHash(String),
    Hset(String, String, String),
    EndHash(String),
    BeginList(String),
    Rpush(String, String),
    EndList(String),
    BeginSet(String),
    Sadd(String, String),
    EndSet(String),
    BeginZSet(String),
    Zadd(String, String, f64),
    EndZSet(String),
    BeginStream(String),
    Xadd(String, String),
    EndStream(String),
}

struct Recorder(Vec<Trace>);

impl EventHandler for Recorder {
    fn handle(&mut self, event: Event) {
        let trace = match event {
            Event::BeginRdb | Event::EndRdb | Event::BeginDatabase(_) | Event::EndDatabase(_) | Event::ResizeDb { .. } => {
                return;
            }
            Event::Aux { key, value } => Trace::Aux(to_s(key), to_s(value)),
            Event::Set { key, value, expire_at_ms } => Trace::Set(to_s(key), to_s(value), expire_at_ms.is_some()),
            Event::BeginHash { key, .. } => Trace::BeginHash(to_s(key)),
            Event::Hset { key, field, value } => Trace::Hset(to_s(key), to_s(field), to_s(value)),
            Event::EndHash { key } => Trace::EndHash(to_s(key)),
            Event::BeginList { key, .. } => Trace::BeginList(to_s(key)),
            Event::Rpush { key, value } => Trace::Rpush(to_s(key), to_s(value)),
            Event::EndList { key } => Trace::EndList(to_s(key)),
            Event::BeginSet { key, .. } => Trace::BeginSet(to_s(key)),
            Event::Sadd { key, member } => Trace::Sadd(to_s(key), to_s(member)),
            Event::EndSet { key } => Trace::EndSet(to_s(key)),
            Event::BeginZSet { key, .. } => Trace::BeginZSet(to_s(key)),
            Event::Zadd { key, member, score } => Trace::Zadd(to_s(key), to_s(member), score),
            Event::EndZSet { key } => Trace::EndZSet(to_s(key)),
            Event::BeginStream { key, .. } => Trace::BeginStream(to_s(key)),
            Event::Xadd { key, id, .. } => Trace::Xadd(to_s(key), id),
            Event::EndStream { key } => Trace::EndStream(to_s(key)),
            Event::Command(_) => return,
        };
        self.0.push(trace);
    }
}

fn to_s(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

/// 把命令压成一个足够区分场景的文本描述，省得把每个变体的借用字段拷成一个新结构体。
fn describe(command: &cmd::Command) -> String {
    use cmd::Command::*;
    match command {
        SET(set) => format!("SET {} {}", String::from_utf8_lossy(set.key), String::from_utf8_lossy(set.value)),
        EXPIRE(expire) => {
            format!("EXPIRE {} {}", String::from_utf8_lossy(expire.key), String::from_utf8_lossy(expire.seconds))
        }
        RPUSH(rpush) => format!("RPUSH {} {}", String::from_utf8_lossy(rpush.key), rpush.elements.len()),
        SELECT(select) => format!("SELECT {}", select.db),
        other => format!("{:?}", other),
    }
}

fn tcp_addr(ctx: &TestContext) -> SocketAddr {
    match ctx.server.get_client_addr() {
        ConnectionAddr::Tcp(host, port) => SocketAddr::new(IpAddr::from_str(host).unwrap(), *port),
        other => panic!("expected a tcp connection, got {:?}", other),
    }
}

fn new_context() -> TestContext {
    env::set_var("REDISRS_SERVER_TYPE", "tcp");
    TestContext::new()
}

/// 同步地把 RDB 重放完（`is_aof = false`，走完 `RDB_TRANSFER` 就返回），返回录到的事件。
fn replay_rdb(ctx: &TestContext) -> Vec<Trace> {
    let mut conf = Config::new(tcp_addr(ctx));
    conf.is_aof = false;
    let recorder = Rc::new(RefCell::new(Recorder(Vec::new())));
    let mut redis_listener =
        listener::Builder::new().with_config(conf).with_event_handler(recorder.clone()).build().unwrap();
    redis_listener.start().expect("replaying the initial RDB snapshot should succeed");
    drop(redis_listener);
    Rc::try_unwrap(recorder).ok().expect("listener dropped its handle").into_inner().0
}

#[test]
#[serial]
fn string_key_replays_as_set_event() {
    let ctx = new_context();
    let _: () = ctx.connection().set("greeting", "hello").unwrap();

    let trace = replay_rdb(&ctx);
    assert!(trace.contains(&Trace::Set("greeting".to_string(), "hello".to_string(), false)));
}

#[test]
#[serial]
fn string_key_with_ttl_carries_an_expiry() {
    let ctx = new_context();
    let _: () = ctx.connection().set_ex("volatile", "soon", 100).unwrap();

    let trace = replay_rdb(&ctx);
    assert!(trace.contains(&Trace::Set("volatile".to_string(), "soon".to_string(), true)));
}

#[test]
#[serial]
fn hash_fields_replay_between_begin_and_end() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.hset("user:1", "name", "ada").unwrap();
    let _: () = con.hset("user:1", "lang", "rust").unwrap();

    let trace = replay_rdb(&ctx);
    let begin = trace.iter().position(|t| *t == Trace::BeginHash("user:1".to_string())).unwrap();
    let end = trace.iter().position(|t| *t == Trace::EndHash("user:1".to_string())).unwrap();
    assert!(begin < end);
    assert!(trace.contains(&Trace::Hset("user:1".to_string(), "name".to_string(), "ada".to_string())));
    assert!(trace.contains(&Trace::Hset("user:1".to_string(), "lang".to_string(), "rust".to_string())));
}

#[test]
#[serial]
fn list_elements_replay_in_order() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.rpush("queue", "a").unwrap();
    let _: () = con.rpush("queue", "b").unwrap();
    let _: () = con.rpush("queue", "c").unwrap();

    let trace = replay_rdb(&ctx);
    let pushes: Vec<&Trace> = trace.iter().filter(|t| matches!(t, Trace::Rpush(key, _) if key == "queue")).collect();
    assert_eq!(
        pushes,
        vec![
            &Trace::Rpush("queue".to_string(), "a".to_string()),
            &Trace::Rpush("queue".to_string(), "b".to_string()),
            &Trace::Rpush("queue".to_string(), "c".to_string()),
        ]
    );
}

#[test]
#[serial]
fn set_members_replay() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.sadd("tags", "rust").unwrap();
    let _: () = con.sadd("tags", "redis").unwrap();

    let trace = replay_rdb(&ctx);
    assert!(trace.contains(&Trace::Sadd("tags".to_string(), "rust".to_string())));
    assert!(trace.contains(&Trace::Sadd("tags".to_string(), "redis".to_string())));
}

#[test]
#[serial]
fn sorted_set_members_carry_their_score() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.zadd("leaderboard", "alice", 10.5).unwrap();
    let _: () = con.zadd("leaderboard", "bob", 7.25).unwrap();

    let trace = replay_rdb(&ctx);
    assert!(trace.contains(&Trace::Zadd("leaderboard".to_string(), "alice".to_string(), 10.5)));
    assert!(trace.contains(&Trace::Zadd("leaderboard".to_string(), "bob".to_string(), 7.25)));
}

// Stream decoding is covered by a hand-built fixture in `src/rdb.rs`'s own test module
// rather than against a live server: a modern `redis-server` writes streams with one of
// the newer listpack-v2/v3 encodings, while this decoder (matching the RDB value types
// this crate targets) only understands the original `RDB_TYPE_STREAM_LISTPACKS`.

#[test]
#[serial]
fn aux_fields_are_surfaced_from_the_rdb_header() {
    let ctx = new_context();
    let _: () = ctx.connection().set("k", "v").unwrap();

    let trace = replay_rdb(&ctx);
    assert!(trace.iter().any(|t| matches!(t, Trace::Aux(key, _) if key == "redis-ver")));
}

#[test]
#[serial]
fn tailing_commands_are_forwarded_after_the_snapshot() {
    let ctx = new_context();
    let addr = tcp_addr(&ctx);

    let running = Arc::new(AtomicBool::new(true));
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));

    let running_for_thread = running.clone();
    let seen_for_thread = seen.clone();
    let t = thread::spawn(move || {
        struct Forwarder(Arc<Mutex<Vec<String>>>);
        impl EventHandler for Forwarder {
            fn handle(&mut self, event: Event) {
                if let Event::Command(command) = event {
                    self.0.lock().unwrap().push(describe(&command));
                }
            }
        }
        let mut conf = Config::new(addr);
        conf.read_timeout = Some(Duration::from_millis(200));
        let handler = Rc::new(RefCell::new(Forwarder(seen_for_thread)));
        let mut redis_listener = listener::Builder::new()
            .with_config(conf)
            .with_control_flag(running_for_thread)
            .with_event_handler(handler)
            .build()
            .unwrap();
        redis_listener.start()
    });

    // give the listener time to finish the handshake and the (empty) initial snapshot
    thread::sleep(Duration::from_millis(500));

    let mut con = ctx.connection();
    let _: () = con.set("aa", "bb").unwrap();
    let _: () = con.expire("aa", 100).unwrap();
    let _: () = con.rpush("list", "hello").unwrap();

    thread::sleep(Duration::from_millis(500));
    running.store(false, Ordering::SeqCst);
    t.join().expect("listener thread panicked").expect("listener returned an error");

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|c| c == "SELECT 0"));
    assert!(seen.iter().any(|c| c == "SET aa bb"));
    assert!(seen.iter().any(|c| c == "EXPIRE aa 100"));
    assert!(seen.iter().any(|c| c == "RPUSH list 1"));
}

#[test]
#[serial]
fn decode_dump_matches_a_live_dump_command() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.set("dumped", "payload").unwrap();
    let dump: Vec<u8> = redis::cmd("DUMP").arg("dumped").query(&mut con).unwrap();

    struct Capture(Vec<(String, String)>);
    impl EventHandler for Capture {
        fn handle(&mut self, event: Event) {
            if let Event::Set { key, value, .. } = event {
                self.0.push((to_s(key), to_s(value)));
            }
        }
    }
    let mut capture = Capture(Vec::new());
    rdb::decode_dump(&dump, 0, b"dumped".to_vec(), None, &mut capture).unwrap();
    assert_eq!(capture.0, vec![("dumped".to_string(), "payload".to_string())]);
}

#[test]
#[serial]
fn decode_dump_rejects_a_corrupted_checksum() {
    let ctx = new_context();
    let mut con = ctx.connection();
    let _: () = con.set("dumped", "payload").unwrap();
    let mut dump: Vec<u8> = redis::cmd("DUMP").arg("dumped").query(&mut con).unwrap();
    let last = dump.len() - 1;
    dump[last] ^= 0xFF;

    let err = rdb::decode_dump(&dump, 0, b"dumped".to_vec(), None, &mut NoOpEventHandler {});
    assert!(err.is_err());
}

#[test]
#[serial]
fn wrong_password_is_rejected_during_the_handshake() {
    let ctx = new_context();
    let mut conf = Config::new(tcp_addr(&ctx));
    conf.password = "wrong-password".to_string();
    conf.is_aof = false;

    let mut redis_listener = listener::Builder::new()
        .with_config(conf)
        .with_event_handler(Rc::new(RefCell::new(NoOpEventHandler {})))
        .build()
        .unwrap();
    assert!(redis_listener.start().is_err());
}
