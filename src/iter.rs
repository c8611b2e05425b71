/*!
 子格式的元素迭代器：一条 RDB 记录里真正的数据可能不是直接以 string/length 的形式
 摆在流里，而是整个被打包进一段 ziplist/zipmap/intset/listpack 字节串——这些迭代器
 负责把这样一段 blob 逐个元素地解出来，供 `rdb` 按 key/value 的粒度投递事件。
*/
use std::io;
use std::io::{Cursor, Error, ErrorKind, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::rdb::Item;

pub(crate) trait Iter {
    fn next(&mut self) -> io::Result<Vec<u8>>;
}

/// list/set 的普通（未压缩）编码：就是 N 个 RDB 字符串。
pub(crate) struct StrValIter<'a> {
    pub(crate) count: i64,
    pub(crate) input: &'a mut dyn Read,
}

impl Iter for StrValIter<'_> {
    fn next(&mut self) -> io::Result<Vec<u8>> {
        if self.count > 0 {
            let val = crate::rdb::RDBDecode::read_string(self.input)?;
            self.count -= 1;
            return Ok(val);
        }
        Err(Error::new(ErrorKind::NotFound, "no element left"))
    }
}

/// quicklist：N 个 ziplist 依次串联，每个 ziplist 内部再逐条展开。
pub(crate) struct QuickListIter<'a> {
    pub(crate) len: i64,
    pub(crate) count: i64,
    pub(crate) input: &'a mut dyn Read,
    pub(crate) cursor: Option<Cursor<Vec<u8>>>,
}

impl Iter for QuickListIter<'_> {
    fn next(&mut self) -> io::Result<Vec<u8>> {
        if self.len == -1 && self.count > 0 {
            let data = crate::rdb::RDBDecode::read_string(self.input)?;
            let mut cursor = Cursor::new(data);
            // 跳过 ZL_BYTES 和 ZL_TAIL
            cursor.set_position(8);
            self.len = cursor.read_u16::<LittleEndian>()? as i64;
            self.cursor = Some(cursor);
            if self.len == 0 {
                self.len = -1;
                self.count -= 1;
                self.cursor = None;
            }
            if self.has_more() {
                return self.next();
            }
        } else if self.count > 0 {
            let val = read_zip_list_entry(self.cursor.as_mut().unwrap())?;
            self.len -= 1;
            if self.len == 0 {
                self.len = -1;
                self.count -= 1;
                self.cursor = None;
            }
            return Ok(val);
        }
        Err(Error::new(ErrorKind::NotFound, "no element left"))
    }
}

impl QuickListIter<'_> {
    fn has_more(&self) -> bool {
        self.len > 0 || self.count > 0
    }
}

/// 单个 ziplist（list/hash/zset 的紧凑编码都复用它）。
pub(crate) struct ZipListIter<'a> {
    pub(crate) count: i64,
    pub(crate) cursor: &'a mut Cursor<Vec<u8>>,
}

impl Iter for ZipListIter<'_> {
    fn next(&mut self) -> io::Result<Vec<u8>> {
        if self.count > 0 {
            let val = read_zip_list_entry(self.cursor)?;
            self.count -= 1;
            return Ok(val);
        }
        Err(Error::new(ErrorKind::NotFound, "no element left"))
    }
}

/// zset/zset2 的普通编码：member、score 交替出现，score 的二进制形式由 `v` 区分。
pub(crate) struct SortedSetIter<'a> {
    pub(crate) count: i64,
    /// 1 = zset（score 以 RDB 文本 double 编码）, 2 = zset2（score 是 LE IEEE754 二进制）
    pub(crate) v: u8,
    pub(crate) input: &'a mut dyn Read,
}

impl SortedSetIter<'_> {
    pub(crate) fn next(&mut self) -> io::Result<Item> {
        if self.count > 0 {
            let member = crate::rdb::RDBDecode::read_string(self.input)?;
            let score = if self.v == 1 {
                crate::rdb::RDBDecode::read_double(self.input)?
            } else {
                let bits = self.input.read_u64::<LittleEndian>()?;
                f64::from_bits(bits)
            };
            self.count -= 1;
            return Ok(Item { member, score });
        }
        Err(Error::new(ErrorKind::NotFound, "no element left"))
    }
}

/// zipmap：legacy 小 hash 的紧凑编码，key/value 交替，各自带一个长度字节，value 后面
/// 还跟着一个 "free" 字节要跳过。
pub(crate) struct ZipMapIter<'a> {
    pub(crate) has_more: bool,
    pub(crate) cursor: &'a mut Cursor<Vec<u8>>,
    pub(crate) pending_value: Option<Vec<u8>>,
}

/// 读取 zipmap 的一个长度字段，返回 `(长度, 载荷后面要跳过的 free 字节数)`。
/// `<=252` 是字面长度；`253` 后面跟一个大端 4 字节的扩展长度，再跟 1 个字节的 free
/// 计数——这个 free 字节是扩展编码本身的一部分，跟字段是 key 还是 value 无关；
/// `254` 是非法值（这是一个协议错误，不是 redis 官方 zipmap.c 留下的保留用途）；
/// `255` 是整个结构的终止符。`read_free` 只影响 `<=252` 分支：按照原始实现，key
/// 的短编码没有 free 字节，value 的短编码总是带一个。
pub(crate) fn read_zm_len(cursor: &mut dyn Read, read_free: bool) -> io::Result<(usize, u8)> {
    let len = cursor.read_u8()?;
    match len {
        0..=252 => {
            let free = if read_free { cursor.read_u8()? } else { 0 };
            Ok((len as usize, free))
        }
        253 => {
            let len = cursor.read_u32::<BigEndian>()? as usize;
            let free = cursor.read_u8()?;
            Ok((len, free))
        }
        254 => Err(Error::new(ErrorKind::InvalidData, "invalid zipmap item length")),
        255 => Ok((255, 0)),
        #[allow(unreachable_patterns)]
        _ => unreachable!(),
    }
}

impl Iter for ZipMapIter<'_> {
    fn next(&mut self) -> io::Result<Vec<u8>> {
        if !self.has_more {
            return Err(Error::new(ErrorKind::NotFound, "no element left"));
        }
        let (key_len, key_free) = read_zm_len(self.cursor, false)?;
        if key_len == 255 {
            self.has_more = false;
            return Err(Error::new(ErrorKind::NotFound, "no element left"));
        }
        let mut key = vec![0; key_len];
        self.cursor.read_exact(&mut key)?;
        if key_free > 0 {
            let mut skip = vec![0; key_free as usize];
            self.cursor.read_exact(&mut skip)?;
        }

        let (value_len, value_free) = read_zm_len(self.cursor, true)?;
        if value_len == 255 {
            return Err(Error::new(ErrorKind::InvalidData, "zipmap truncated after key"));
        }
        let mut value = vec![0; value_len];
        self.cursor.read_exact(&mut value)?;
        if value_free > 0 {
            let mut skip = vec![0; value_free as usize];
            self.cursor.read_exact(&mut skip)?;
        }

        self.pending_value = Some(value);
        Ok(key)
    }
}

impl<'a> ZipMapIter<'a> {
    pub(crate) fn next_pair(&mut self) -> io::Result<Option<(Vec<u8>, Vec<u8>)>> {
        if !self.has_more {
            return Ok(None);
        }
        let key = match Iter::next(self) {
            Ok(k) => k,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let value = self.pending_value.take().expect("read_zm pair without a value");
        Ok(Some((key, value)))
    }
}

/// intset：紧凑的整数集合，`encoding` 取 2/4/8 字节宽，小端有符号整数，转成十进制
/// ASCII 表示（和其他迭代器统一以 `Vec<u8>` 形式返回成员）。
pub(crate) struct IntSetIter<'a> {
    pub(crate) encoding: i32,
    pub(crate) count: i64,
    pub(crate) cursor: &'a mut Cursor<Vec<u8>>,
}

impl Iter for IntSetIter<'_> {
    fn next(&mut self) -> io::Result<Vec<u8>> {
        if self.count <= 0 {
            return Err(Error::new(ErrorKind::NotFound, "no element left"));
        }
        let val = match self.encoding {
            2 => self.cursor.read_i16::<LittleEndian>()?.to_string().into_bytes(),
            4 => self.cursor.read_i32::<LittleEndian>()?.to_string().into_bytes(),
            8 => self.cursor.read_i64::<LittleEndian>()?.to_string().into_bytes(),
            other => return Err(Error::new(ErrorKind::InvalidData, format!("invalid intset encoding: {}", other))),
        };
        self.count -= 1;
        Ok(val)
    }
}

/// 一个 ziplist 条目：前置长度字节（前一个条目的长度，用于反向遍历，这里只管跳过），
/// 然后是这个条目自己的编码头：高 2 位为 `00/01/10` 时是字符串（6/14/32 位长度），
/// 否则是一个整数特殊编码（`ZIP_INT_*`，或者 4 位立即数 `1111xxxx`，值是 `xxxx - 1`）。
pub(crate) fn read_zip_list_entry(cursor: &mut Cursor<Vec<u8>>) -> io::Result<Vec<u8>> {
    let prev_len_byte = cursor.read_u8()?;
    if prev_len_byte >= 254 {
        cursor.read_u32::<LittleEndian>()?;
    }
    let flag = cursor.read_u8()?;
    match flag >> 6 {
        0 => {
            let length = flag & 0x3F;
            let mut buf = vec![0; length as usize];
            cursor.read_exact(&mut buf)?;
            return Ok(buf);
        }
        1 => {
            let next_byte = cursor.read_u8()?;
            let length = (((flag as u16) & 0x3F) << 8) | (next_byte as u16);
            let mut buf = vec![0; length as usize];
            cursor.read_exact(&mut buf)?;
            return Ok(buf);
        }
        2 => {
            let length = cursor.read_u32::<BigEndian>()?;
            let mut buf = vec![0; length as usize];
            cursor.read_exact(&mut buf)?;
            return Ok(buf);
        }
        _ => {}
    }
    match flag {
        ZIP_INT_8BIT => Ok(cursor.read_i8()?.to_string().into_bytes()),
        ZIP_INT_16BIT => Ok(cursor.read_i16::<LittleEndian>()?.to_string().into_bytes()),
        ZIP_INT_24BIT => Ok(cursor.read_i24::<LittleEndian>()?.to_string().into_bytes()),
        ZIP_INT_32BIT => Ok(cursor.read_i32::<LittleEndian>()?.to_string().into_bytes()),
        ZIP_INT_64BIT => Ok(cursor.read_i64::<LittleEndian>()?.to_string().into_bytes()),
        _ => {
            // 4 位立即数编码：`1111xxxx`，值域 0..=12，真实值是 xxxx - 1。
            let value = (flag as i64) - 0xF1;
            Ok(value.to_string().into_bytes())
        }
    }
}

const ZIP_INT_8BIT: u8 = 0xFE;
const ZIP_INT_16BIT: u8 = 0xC0;
const ZIP_INT_24BIT: u8 = 0xF0;
const ZIP_INT_32BIT: u8 = 0xD0;
const ZIP_INT_64BIT: u8 = 0xE0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_list_small_string() {
        let mut cursor = Cursor::new(vec![0x00, 0x03, b'f', b'o', b'o']);
        let v = read_zip_list_entry(&mut cursor).unwrap();
        assert_eq!(v, b"foo");
    }

    #[test]
    fn zip_list_immediate_int() {
        // 0xF5 => value = 0xF5 - 0xF1 = 4
        let mut cursor = Cursor::new(vec![0x00, 0xF5]);
        let v = read_zip_list_entry(&mut cursor).unwrap();
        assert_eq!(v, b"4");
    }

    #[test]
    fn zip_map_single_pair() {
        let mut cursor = Cursor::new(vec![3, b'f', b'o', b'o', 3, 0, b'b', b'a', b'r', 0xFF]);
        let mut iter = ZipMapIter { has_more: true, cursor: &mut cursor, pending_value: None };
        let pair = iter.next_pair().unwrap().unwrap();
        assert_eq!(pair, (b"foo".to_vec(), b"bar".to_vec()));
        assert!(iter.next_pair().unwrap().is_none());
    }

    #[test]
    fn zip_map_rejects_reserved_254_length() {
        let mut cursor = Cursor::new(vec![254]);
        assert!(read_zm_len(&mut cursor, false).is_err());
    }

    #[test]
    fn zip_map_extended_length_key_skips_its_trailing_free_byte() {
        // key "foo" 编码成扩展(253)长度：tag, 4 字节长度=3, free=2（载荷后要跳过 2 个
        // 填充字节），接着是载荷本身和填充；然后 value "bar" 用普通短编码。
        let mut cursor = Cursor::new(vec![
            253, 0, 0, 0, 3, 2, b'f', b'o', b'o', 0xAA, 0xBB, // key + 2 字节填充
            3, 0, b'b', b'a', b'r', // value，短编码，free=0
            0xFF,
        ]);
        let mut iter = ZipMapIter { has_more: true, cursor: &mut cursor, pending_value: None };
        let pair = iter.next_pair().unwrap().unwrap();
        assert_eq!(pair, (b"foo".to_vec(), b"bar".to_vec()));
        assert!(iter.next_pair().unwrap().is_none());
    }

    #[test]
    fn int_set_reads_little_endian_signed_members() {
        let mut cursor = Cursor::new((-1i32).to_le_bytes().to_vec());
        let mut iter = IntSetIter { encoding: 4, count: 1, cursor: &mut cursor };
        assert_eq!(Iter::next(&mut iter).unwrap(), b"-1");
    }
}
