//! Minimal class-file reader that splits a class into header, constant pool
//! and everything after it.
//!
//! Only the constant pool is decoded. The structures that follow it address
//! pool entries by index, so they can be carried over as opaque bytes as long
//! as the pool keeps its entry count and ordering.

use thiserror::Error;

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Oldest class-file major version (JDK 1.0.2).
pub const MIN_MAJOR_VERSION: u16 = 45;

const HEADER_LEN: usize = 8;

// access_flags, this_class, super_class
const MIN_REMAINDER_LEN: usize = 6;

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFormatError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("truncated while reading {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("constant pool count is zero")]
    EmptyPool,

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },

    #[error("constant pool entry {index} would be {len} bytes, over the 65535 byte limit")]
    Utf8TooLong { index: u16, len: usize },
}

/// One constant pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Const<'a> {
    /// Slot 0 and the slot after a `Long`/`Double`; never serialized.
    Unusable,
    /// A `CONSTANT_Utf8` payload (modified UTF-8, without its length prefix).
    Utf8(&'a [u8]),
    /// Any other record, kept as its tag plus fixed-size body.
    Other { tag: u8, body: &'a [u8] },
}

/// Constant pool with entries at their JVM indices (slot 0 is unusable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstPool<'a>(pub Vec<Const<'a>>);

impl<'a> ConstPool<'a> {
    /// The `constant_pool_count` value: number of slots including slot 0.
    pub fn count(&self) -> u16 {
        // Parsing caps the slot count at u16::MAX.
        self.0.len() as u16
    }

    pub fn get(&self, index: u16) -> Option<&Const<'a>> {
        self.0.get(usize::from(index))
    }

    pub fn utf8_entries(&self) -> impl Iterator<Item = (u16, &'a [u8])> + '_ {
        self.0.iter().enumerate().filter_map(|(index, entry)| match entry {
            Const::Utf8(bytes) => Some((index as u16, *bytes)),
            _ => None,
        })
    }
}

/// A parsed class file borrowing from the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile<'a> {
    pub header: &'a [u8],
    pub pool: ConstPool<'a>,
    pub remainder: &'a [u8],
}

impl<'a> ClassFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ClassFormatError> {
        let mut reader = Reader { data, offset: 0 };

        let magic = reader.u32("magic")?;
        if magic != CLASS_MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        reader.take(4, "version")?;
        let header = &data[..HEADER_LEN];

        let count = reader.u16("constant pool count")?;
        if count == 0 {
            return Err(ClassFormatError::EmptyPool);
        }

        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(Const::Unusable);
        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8("constant tag")?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = reader.u16("utf8 length")?;
                    Const::Utf8(reader.take(usize::from(len), "utf8 bytes")?)
                }
                _ => {
                    let size = body_size(tag).ok_or(ClassFormatError::UnknownTag { tag, index })?;
                    Const::Other {
                        tag,
                        body: reader.take(size, "constant body")?,
                    }
                }
            };
            entries.push(entry);
            index += 1;
            if matches!(tag, TAG_LONG | TAG_DOUBLE) && index < count {
                entries.push(Const::Unusable);
                index += 1;
            }
        }

        let remainder = &data[reader.offset..];
        if remainder.len() < MIN_REMAINDER_LEN {
            return Err(ClassFormatError::Truncated {
                what: "class header",
                offset: reader.offset,
            });
        }

        Ok(ClassFile {
            header,
            pool: ConstPool(entries),
            remainder,
        })
    }

    /// Serialize with replacement `Utf8` payloads looked up by index.
    ///
    /// Every entry keeps its slot; only `Utf8` lengths can change.
    pub fn write_with<F>(&self, mut utf8_for: F) -> Result<Vec<u8>, ClassFormatError>
    where
        F: FnMut(u16, &'a [u8]) -> Option<Vec<u8>>,
    {
        let mut out = Vec::with_capacity(self.header.len() + self.remainder.len() + 1024);
        out.extend_from_slice(self.header);
        out.extend_from_slice(&self.pool.count().to_be_bytes());

        for (index, entry) in self.pool.0.iter().enumerate() {
            let index = index as u16;
            match entry {
                Const::Unusable => {}
                Const::Utf8(bytes) => {
                    let replaced = utf8_for(index, *bytes);
                    let payload = replaced.as_deref().unwrap_or(*bytes);
                    let len = u16::try_from(payload.len()).map_err(|_| {
                        ClassFormatError::Utf8TooLong {
                            index,
                            len: payload.len(),
                        }
                    })?;
                    out.push(TAG_UTF8);
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(payload);
                }
                Const::Other { tag, body } => {
                    out.push(*tag);
                    out.extend_from_slice(body);
                }
            }
        }

        out.extend_from_slice(self.remainder);
        Ok(out)
    }
}

/// `true` when `data` starts like a class file rather than another
/// `0xCAFEBABE` format such as a Mach-O universal binary.
pub fn looks_like_class(data: &[u8]) -> bool {
    data.len() >= HEADER_LEN
        && data[..4] == CLASS_MAGIC.to_be_bytes()
        && u16::from_be_bytes([data[6], data[7]]) >= MIN_MAJOR_VERSION
}

fn body_size(tag: u8) -> Option<usize> {
    match tag {
        TAG_CLASS | TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => Some(2),
        TAG_METHOD_HANDLE => Some(3),
        TAG_INTEGER
        | TAG_FLOAT
        | TAG_FIELDREF
        | TAG_METHODREF
        | TAG_INTERFACE_METHODREF
        | TAG_NAME_AND_TYPE
        | TAG_DYNAMIC
        | TAG_INVOKE_DYNAMIC => Some(4),
        TAG_LONG | TAG_DOUBLE => Some(8),
        _ => None,
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFormatError::Truncated {
                what,
                offset: self.offset,
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, ClassFormatError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, ClassFormatError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, ClassFormatError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
