//! 统一的错误类型，对应文档里划分的几类错误：Io、Protocol、UnsupportedFeature、
//! ChecksumMismatch、InvalidArgument。库内部一律通过 `Result<T>` 传播，不使用 panic
//! 来表达可恢复的失败。

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, RedisEventError>;

/// 复制会话里能观察到的全部错误种类。
#[derive(Debug)]
pub enum RedisEventError {
    /// 底层连接失败，会话不可恢复。
    Io(io::Error),
    /// RESP 或 RDB 字节不符合协议，携带可读的原因。
    Protocol(String),
    /// module、未知的 value type、超出范围的 rdb 版本。
    UnsupportedFeature(String),
    /// 仅由独立的 dump 校验返回，不会终止正在进行的会话。
    ChecksumMismatch { expected: u64, actual: u64 },
    /// 调用方传入的参数本身就是非法的，会话从未开始。
    InvalidArgument(String),
}

impl RedisEventError {
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        RedisEventError::Protocol(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        RedisEventError::UnsupportedFeature(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RedisEventError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for RedisEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisEventError::Io(e) => write!(f, "io error: {}", e),
            RedisEventError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            RedisEventError::UnsupportedFeature(msg) => write!(f, "unsupported feature: {}", msg),
            RedisEventError::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch: expected {:016x}, got {:016x}",
                expected, actual
            ),
            RedisEventError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for RedisEventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedisEventError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RedisEventError {
    fn from(e: io::Error) -> Self {
        RedisEventError::Io(e)
    }
}

impl From<RedisEventError> for io::Error {
    fn from(e: RedisEventError) -> Self {
        match e {
            RedisEventError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
