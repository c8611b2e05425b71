//! LZF 解压缩。RDB 里长字符串可能以 LZF 压缩形式存储（见 rdb.rs 里 `RDB_ENC_LZF` 分支）。
//!
//! 原始实现是链接到系统上的 liblzf 的一段 C FFI（`extern "C" fn lzf_decompress`），但
//! 这份仓库里并没有带上对应的 C 源码，用 `#[link]` 去链接一个不存在的库只是制造一个
//! 永远 link 不过的占位符。这里直接照着算法用安全 Rust 重写了一遍。

use crate::error::{RedisEventError, Result};

/// 把 `input` 解压到恰好 `out_len` 字节，返回解压后的缓冲区。
///
/// 不断读取一个控制字节 `ctrl`：`ctrl < 32` 时，后面跟着 `ctrl + 1` 个字面字节，原样
/// 拷贝；否则 `ctrl >> 5` 给出匹配长度（等于 7 时，长度由紧随其后的一个字节扩展），
/// 紧跟着的一个字节与 `ctrl` 低 5 位拼出回溯距离，拷贝 `length + 2` 字节——必须逐字节
/// 拷贝，因为距离可能小于长度，这正是游程展开所依赖的重叠拷贝效果。
pub fn decompress(input: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; out_len];
    let mut ip = 0usize;
    let mut op = 0usize;

    while op < out_len {
        if ip >= input.len() {
            return Err(RedisEventError::protocol("lzf: input exhausted before out_len reached"));
        }
        let ctrl = input[ip] as usize;
        ip += 1;

        if ctrl < 32 {
            let len = ctrl + 1;
            if ip + len > input.len() || op + len > out_len {
                return Err(RedisEventError::protocol("lzf: literal run overruns buffer"));
            }
            out[op..op + len].copy_from_slice(&input[ip..ip + len]);
            ip += len;
            op += len;
        } else {
            let mut len = ctrl >> 5;
            if len == 7 {
                if ip >= input.len() {
                    return Err(RedisEventError::protocol("lzf: truncated length extension"));
                }
                len += input[ip] as usize;
                ip += 1;
            }
            if ip >= input.len() {
                return Err(RedisEventError::protocol("lzf: truncated back-reference"));
            }
            let distance = (((ctrl & 0x1f) << 8) | (input[ip] as usize)) + 1;
            ip += 1;

            if distance > op {
                return Err(RedisEventError::protocol("lzf: back-reference before start of output"));
            }
            let copy_len = len + 2;
            if op + copy_len > out_len {
                return Err(RedisEventError::protocol("lzf: back-reference overruns buffer"));
            }
            let mut from = op - distance;
            let mut to = op;
            for _ in 0..copy_len {
                out[to] = out[from];
                from += 1;
                to += 1;
            }
            op += copy_len;
        }
    }

    Ok(out)
}
