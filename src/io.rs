/*!
 字节粒度的读取层：`CountReader` 包一层 `Read`，在复制偏移量开始计数之后，统计
 每次读取消耗了多少字节，供 `listener` 在每帧读取完毕后累加进 `ReplState`。
 这里还放着两个被 `rdb`/`iter` 复用的自由函数：变长整数读取 `read_long`，以及
 listpack 单个元素的解码 `read_list_pack_entry`。
*/

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Error, ErrorKind, Read, Result, Write};

use crate::resp::{CR, DOLLAR, LF, STAR};

pub(crate) struct CountReader<'a> {
    input: &'a mut dyn Read,
    len: i64,
    marked: bool,
}

impl Read for CountReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.input.read(buf)?;
        if self.marked {
            self.len += len as i64;
        };
        Ok(len)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.input.read_exact(buf)?;
        if self.marked {
            self.len += buf.len() as i64;
        };
        Ok(())
    }
}

impl<'a> CountReader<'a> {
    pub(crate) fn new(input: &'a mut dyn Read) -> CountReader<'a> {
        CountReader { input, len: 0, marked: false }
    }

    /// 从现在开始统计读取的字节数。
    pub(crate) fn mark(&mut self) {
        self.marked = true;
    }

    /// 停止统计，返回这一段总共读了多少字节。
    pub(crate) fn reset(&mut self) -> Result<i64> {
        if self.marked {
            let len = self.len;
            self.len = 0;
            self.marked = false;
            return Ok(len);
        }
        Err(Error::new(ErrorKind::Other, "not marked"))
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let b = self.input.read_u8()?;
        if self.marked {
            self.len += 1;
        };
        Ok(b)
    }
}

/// 按大端或小端读取一个 `length` 字节宽的整数，逐字节累加，用于 intset 的成员解码
/// 以及流 id 的 ms/seq 部分。
pub(crate) fn read_long(input: &mut dyn Read, length: i32, little_endian: bool) -> Result<i64> {
    let mut r: i64 = 0;
    for i in 0..length {
        let v: i64 = input.read_u8()? as i64;
        if little_endian {
            r |= v << (i << 3) as i64;
        } else {
            r = (r << 8) | v;
        }
    }
    Ok(r)
}

/// 解码 listpack 里的一个元素，返回其内容的十进制 ASCII（整数编码）或原始字节（字符串
/// 编码），并吃掉紧随其后的回溯长度字段。编码：7 位无符号整数 `0xxxxxxx`；6 位字符串
/// `10xxxxxx`；13 位有符号整数 `110xxxxx`（偏移 -8192）；12 位字符串 `1110xxxx`；
/// 16/24/32/64 位整数 `0xF1..0xF4`；32 位字符串 `0xF0`。
pub(crate) fn read_list_pack_entry(input: &mut dyn Read) -> Result<Vec<u8>> {
    let special = input.read_u8()? as i32;
    let skip: i32;
    let bytes;
    if (special & 0x80) == 0 {
        skip = 1;
        let value = special & 0x7F;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xC0) == 0x80 {
        let len = special & 0x3F;
        skip = 1 + len;
        let mut buf = vec![0; len as usize];
        input.read_exact(&mut buf)?;
        bytes = buf;
    } else if (special & 0xE0) == 0xC0 {
        skip = 2;
        let next = input.read_u8()?;
        let value = (((special & 0x1F) << 8) | next as i32) << 19 >> 19;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xFF) == 0xF1 {
        skip = 3;
        let value = input.read_i16::<LittleEndian>()?;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xFF) == 0xF2 {
        skip = 4;
        let value = input.read_i24::<LittleEndian>()?;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xFF) == 0xF3 {
        skip = 5;
        let value = input.read_i32::<LittleEndian>()?;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xFF) == 0xF4 {
        skip = 9;
        let value = input.read_i64::<LittleEndian>()?;
        bytes = value.to_string().into_bytes();
    } else if (special & 0xF0) == 0xE0 {
        let next = input.read_u8()?;
        let len = ((special & 0x0F) << 8) | next as i32;
        skip = 2 + len;
        let mut buf = vec![0; len as usize];
        input.read_exact(&mut buf)?;
        bytes = buf;
    } else if (special & 0xFF) == 0xF0 {
        let len = input.read_u32::<BigEndian>()?;
        skip = 5 + len as i32;
        let mut buf = vec![0; len as usize];
        input.read_exact(&mut buf)?;
        bytes = buf;
    } else {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("listpack: unrecognized entry header byte {:#x}", special),
        ));
    }
    // 回溯长度字段的宽度是变长的，取决于 `skip` 本身的大小。
    let back_len_width = if skip <= 127 {
        1
    } else if skip < 16383 {
        2
    } else if skip < 2097151 {
        3
    } else if skip < 268435455 {
        4
    } else {
        5
    };
    let mut buf = vec![0; back_len_width];
    input.read_exact(&mut buf)?;
    Ok(bytes)
}

/// 以 RESP multibulk 的形式写出一条命令（用于握手阶段和 ACK 帧）。
pub(crate) fn send<T: Write>(output: &mut T, command: &[u8], args: &[&[u8]]) -> Result<()> {
    let mut buf = vec![];
    buf.write_all(&[STAR])?;
    let args_len = args.len() + 1;
    buf.write_all(&args_len.to_string().into_bytes())?;
    buf.write_all(&[CR, LF, DOLLAR])?;
    buf.write_all(&command.len().to_string().into_bytes())?;
    buf.write_all(&[CR, LF])?;
    buf.write_all(command)?;
    buf.write_all(&[CR, LF])?;
    for arg in args {
        buf.write_all(&[DOLLAR])?;
        buf.write_all(&arg.len().to_string().into_bytes())?;
        buf.write_all(&[CR, LF])?;
        buf.write_all(arg)?;
        buf.write_all(&[CR, LF])?;
    }
    output.write_all(&buf)?;
    output.flush()
}

/// 丢弃 rdb 传输的字节，不做解码（`Config::is_discard_rdb`）。
pub(crate) fn skip(input: &mut dyn Read, length: i64) -> Result<()> {
    std::io::copy(&mut input.take(length as u64), &mut std::io::sink())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn count_reader_tracks_bytes_only_while_marked() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = Cursor::new(&data[..]);
        let mut reader = CountReader::new(&mut cursor);
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert!(reader.reset().is_err());
        reader.mark();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.reset().unwrap(), 2);
    }

    #[test]
    fn seven_bit_listpack_int() {
        let mut cursor = Cursor::new(vec![0x7f, 0xaa]);
        let v = read_list_pack_entry(&mut cursor).unwrap();
        assert_eq!(v, b"127");
    }

    #[test]
    fn thirteen_bit_listpack_int_is_signed() {
        // 0xC0 0x00 encodes a 13-bit int with all payload bits zero except the sign area;
        // the raw 13-bit payload is 0, which decodes to 0 after the sign-extension shift.
        let mut cursor = Cursor::new(vec![0xC0, 0x00, 0xaa]);
        let v = read_list_pack_entry(&mut cursor).unwrap();
        assert_eq!(v, b"0");
    }

    #[test]
    fn six_bit_listpack_string() {
        let mut cursor = Cursor::new(vec![0x83, b'h', b'i', b'!', 0xaa]);
        let v = read_list_pack_entry(&mut cursor).unwrap();
        assert_eq!(v, b"hi!");
    }
}
