/*!
定义[`RedisListener`]所需的各项配置信息。

[`RedisListener`]: trait.RedisListener.html
*/
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(5 * 60);

/// 配置信息结构体定义。
#[derive(Debug, Clone)]
pub struct Config {
    /// 是否跳过整个 RDB 不进行解码，直接丢弃后进入命令 tailing
    pub is_discard_rdb: bool,
    /// 是否需要继续 tailing 命令流；为 false 时处理完 RDB 后 `RedisListener` 将中止
    pub is_aof: bool,
    /// master 的地址信息
    pub addr: SocketAddr,
    /// master 的密码，握手时在 REPLCONF 之前先做一次 AUTH；为空则跳过
    pub password: String,
    /// Replication ID，未知时使用 "?"
    pub repl_id: String,
    /// Replication Offset，未知时使用 -1
    pub repl_offset: i64,
    /// 读超时
    pub read_timeout: Option<Duration>,
    /// 写超时
    pub write_timeout: Option<Duration>,
    /// TCP keepalive 间隔，默认 5 分钟
    pub keepalive: Duration,
    /// 是否用 TLS 包装连接，需要启用 `tls` feature
    #[cfg(feature = "tls")]
    pub tls_enabled: bool,
    /// TLS 连接是否跳过证书校验（自签名证书场景）
    #[cfg(feature = "tls")]
    pub tls_insecure_skip_verify: bool,
    /// 用于双向 TLS 的客户端身份
    #[cfg(feature = "tls")]
    pub identity: Option<native_tls::Identity>,
}

impl Config {
    /// 只有地址是必填项，其余字段取默认值：不丢弃 RDB、继续 tailing、无密码、
    /// repl_id="?"、repl_offset=-1、读写不超时、keepalive 5 分钟、不启用 TLS。
    pub fn new(addr: SocketAddr) -> Config {
        Config {
            is_discard_rdb: false,
            is_aof: true,
            addr,
            password: String::new(),
            repl_id: String::from("?"),
            repl_offset: -1,
            read_timeout: None,
            write_timeout: None,
            keepalive: DEFAULT_KEEPALIVE,
            #[cfg(feature = "tls")]
            tls_enabled: false,
            #[cfg(feature = "tls")]
            tls_insecure_skip_verify: false,
            #[cfg(feature = "tls")]
            identity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_match_an_unknown_replica() {
        let conf = Config::new(SocketAddr::from_str("127.0.0.1:6379").unwrap());
        assert_eq!(conf.repl_id, "?");
        assert_eq!(conf.repl_offset, -1);
        assert_eq!(conf.keepalive, DEFAULT_KEEPALIVE);
        assert!(conf.is_aof);
        assert!(!conf.is_discard_rdb);
    }
}
