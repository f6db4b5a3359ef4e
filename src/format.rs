//! Leaf and variable-length format descriptors.
//!
//! A [`Format`] is stateless: it packs a [`Value`] into bytes, unpacks it again,
//! converts it to and from JSON and renders the matching C declaration parts.
//! Fixed kinds always occupy the same number of bytes; variable kinds carry an
//! unsigned length prefix followed by their elements.

use crate::codec::Endianness;
use crate::error::{DecodingError, ValueError};
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;

/// Integer widths available to scalar, array and length-prefix formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl IntType {
    pub fn size(self) -> usize {
        match self {
            IntType::U8 | IntType::I8 => 1,
            IntType::U16 | IntType::I16 => 2,
            IntType::U32 | IntType::I32 => 4,
            IntType::U64 | IntType::I64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntType::I8 | IntType::I16 | IntType::I32 | IntType::I64)
    }

    pub fn min(self) -> i128 {
        match self {
            IntType::U8 | IntType::U16 | IntType::U32 | IntType::U64 => 0,
            IntType::I8 => i8::MIN as i128,
            IntType::I16 => i16::MIN as i128,
            IntType::I32 => i32::MIN as i128,
            IntType::I64 => i64::MIN as i128,
        }
    }

    pub fn max(self) -> i128 {
        match self {
            IntType::U8 => u8::MAX as i128,
            IntType::U16 => u16::MAX as i128,
            IntType::U32 => u32::MAX as i128,
            IntType::U64 => u64::MAX as i128,
            IntType::I8 => i8::MAX as i128,
            IntType::I16 => i16::MAX as i128,
            IntType::I32 => i32::MAX as i128,
            IntType::I64 => i64::MAX as i128,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntType::U8 => "u8",
            IntType::U16 => "u16",
            IntType::U32 => "u32",
            IntType::U64 => "u64",
            IntType::I8 => "i8",
            IntType::I16 => "i16",
            IntType::I32 => "i32",
            IntType::I64 => "i64",
        }
    }

    pub fn c_type(self) -> &'static str {
        match self {
            IntType::U8 => "uint8_t",
            IntType::U16 => "uint16_t",
            IntType::U32 => "uint32_t",
            IntType::U64 => "uint64_t",
            IntType::I8 => "int8_t",
            IntType::I16 => "int16_t",
            IntType::I32 => "int32_t",
            IntType::I64 => "int64_t",
        }
    }

    pub fn from_name(name: &str) -> Option<IntType> {
        Some(match name {
            "u8" => IntType::U8,
            "u16" => IntType::U16,
            "u32" => IntType::U32,
            "u64" => IntType::U64,
            "i8" => IntType::I8,
            "i16" => IntType::I16,
            "i32" => IntType::I32,
            "i64" => IntType::I64,
            _ => return None,
        })
    }

    /// Range-check an integer value against this width.
    pub fn check(self, v: &Value) -> Result<i128, ValueError> {
        let n = v.as_i128().ok_or(ValueError::TypeMismatch {
            expected: self.name(),
            found: v.kind(),
        })?;
        self.check_raw(n)
    }

    fn check_raw(self, n: i128) -> Result<i128, ValueError> {
        if n < self.min() || n > self.max() {
            return Err(ValueError::OutOfRange { value: n, ty: self });
        }
        Ok(n)
    }

    /// Build the width-specific value. `n` must already be in range.
    pub fn make_value(self, n: i128) -> Value {
        match self {
            IntType::U8 => Value::U8(n as u8),
            IntType::U16 => Value::U16(n as u16),
            IntType::U32 => Value::U32(n as u32),
            IntType::U64 => Value::U64(n as u64),
            IntType::I8 => Value::I8(n as i8),
            IntType::I16 => Value::I16(n as i16),
            IntType::I32 => Value::I32(n as i32),
            IntType::I64 => Value::I64(n as i64),
        }
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format descriptor bound to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    /// Integer scalar (`count == 1`) or fixed-length integer array.
    Int { ty: IntType, count: usize },
    /// One byte, 0 or 1; any nonzero byte decodes to `true`.
    Bool,
    /// Zero-padded UTF-8 string of exactly `n` bytes.
    FixedStr(usize),
    /// `len` raw bytes shown as a hex string, bytes joined by `sep`.
    FixedHex { len: usize, sep: String },
    /// Length prefix followed by that many `child` elements.
    VarArray { child: Box<Format>, len: IntType },
    /// Length prefix followed by that many UTF-8 bytes.
    VarStr { len: IntType },
}

impl Format {
    pub fn int(ty: IntType) -> Self {
        Format::Int { ty, count: 1 }
    }

    pub fn u8() -> Self {
        Format::int(IntType::U8)
    }

    pub fn u16() -> Self {
        Format::int(IntType::U16)
    }

    pub fn u32() -> Self {
        Format::int(IntType::U32)
    }

    pub fn i8() -> Self {
        Format::int(IntType::I8)
    }

    pub fn i16() -> Self {
        Format::int(IntType::I16)
    }

    pub fn i32() -> Self {
        Format::int(IntType::I32)
    }

    pub fn array(ty: IntType, count: usize) -> Self {
        Format::Int { ty, count }
    }

    pub fn fixed_str(n: usize) -> Self {
        Format::FixedStr(n)
    }

    pub fn hex(len: usize) -> Self {
        Format::FixedHex {
            len,
            sep: String::new(),
        }
    }

    pub fn hex_sep(len: usize, sep: impl Into<String>) -> Self {
        Format::FixedHex {
            len,
            sep: sep.into(),
        }
    }

    /// Variable array with the default one-byte length prefix.
    pub fn var_array(child: Format) -> Self {
        Format::var_array_with(child, IntType::U8)
    }

    pub fn var_array_with(child: Format, len: IntType) -> Self {
        Format::VarArray {
            child: Box::new(child),
            len,
        }
    }

    pub fn var_str() -> Self {
        Format::VarStr { len: IntType::U8 }
    }

    pub fn var_str_with(len: IntType) -> Self {
        Format::VarStr { len }
    }

    /// Definition-time checks. Returns the reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Format::Int { count: 0, .. } => Err("array count must be positive".to_string()),
            Format::Int { ty, count } if ty.size().checked_mul(*count).is_none() => {
                Err(format!("{} x {} bytes overflows the address space", count, ty.size()))
            }
            Format::FixedStr(0) | Format::FixedHex { len: 0, .. } => {
                Err("length must be positive".to_string())
            }
            Format::VarArray { child, len } => {
                check_prefix(*len)?;
                if child.is_variable() {
                    return Err("array elements must have a fixed size".to_string());
                }
                child.validate()
            }
            Format::VarStr { len } => check_prefix(*len),
            _ => Ok(()),
        }
    }

    /// Smallest encoded size. For variable kinds only the length prefix counts.
    pub fn min_size(&self) -> usize {
        match self {
            Format::Int { ty, count } => ty.size().saturating_mul(*count),
            Format::Bool => 1,
            Format::FixedStr(n) => *n,
            Format::FixedHex { len, .. } => *len,
            Format::VarArray { len, .. } | Format::VarStr { len } => len.size(),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Format::VarArray { .. } | Format::VarStr { .. })
    }

    /// True for a single integer, the only shape allowed as a union discriminator.
    pub fn as_scalar_int(&self) -> Option<IntType> {
        match self {
            Format::Int { ty, count: 1 } => Some(*ty),
            _ => None,
        }
    }

    pub fn encode(&self, value: &Value, order: Endianness) -> Result<Vec<u8>, ValueError> {
        let mut out = Vec::with_capacity(self.min_size());
        self.write(value, order, &mut out)?;
        Ok(out)
    }

    pub fn write(&self, value: &Value, order: Endianness, out: &mut Vec<u8>) -> Result<(), ValueError> {
        match self {
            Format::Int { ty, count: 1 } => {
                let n = ty.check(value)?;
                write_int(out, *ty, n, order);
            }
            Format::Int { ty, count } => {
                let items = expect_list(value)?;
                if items.len() != *count {
                    return Err(ValueError::ArrayLength {
                        expected: *count,
                        found: items.len(),
                    });
                }
                for item in items {
                    let n = ty.check(item)?;
                    write_int(out, *ty, n, order);
                }
            }
            Format::Bool => {
                let b = value.as_bool().ok_or(ValueError::TypeMismatch {
                    expected: "bool",
                    found: value.kind(),
                })?;
                out.push(b as u8);
            }
            Format::FixedStr(n) => {
                let bytes = truncate_utf8(expect_str(value)?, *n);
                out.extend_from_slice(bytes);
                out.resize(out.len() + (*n - bytes.len()), 0);
            }
            Format::FixedHex { len, sep } => {
                let raw = parse_hex(expect_str(value)?, *len, sep)?;
                out.extend_from_slice(&raw);
            }
            Format::VarArray { child, len } => {
                let items = expect_list(value)?;
                write_len(out, *len, items.len(), order)?;
                for item in items {
                    child.write(item, order, out)?;
                }
            }
            Format::VarStr { len } => {
                let s = expect_str(value)?;
                write_len(out, *len, s.len(), order)?;
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    /// Decode one value from the front of `data`, returning it with the unconsumed remainder.
    pub fn decode<'a>(&self, data: &'a [u8], order: Endianness) -> Result<(Value, &'a [u8]), DecodingError> {
        let mut r = Cursor::new(data);
        let v = self.read(&mut r, order)?;
        Ok((v, &data[r.position() as usize..]))
    }

    pub fn read(&self, r: &mut Cursor<&[u8]>, order: Endianness) -> Result<Value, DecodingError> {
        Ok(match self {
            Format::Int { ty, count: 1 } => read_int(r, *ty, order)?,
            Format::Int { ty, count } => {
                ensure(r, ty.size().saturating_mul(*count))?;
                let mut items = Vec::with_capacity(*count);
                for _ in 0..*count {
                    items.push(read_int(r, *ty, order)?);
                }
                Value::List(items)
            }
            Format::Bool => Value::Bool(take(r, 1)?[0] != 0),
            Format::FixedStr(n) => Value::Str(utf8_trimmed(take(r, *n)?)?),
            Format::FixedHex { len, sep } => Value::Str(format_hex(take(r, *len)?, sep)),
            Format::VarArray { child, len } => {
                let n = read_len(r, *len, order)?;
                let remaining = r.get_ref().len() - r.position() as usize;
                let mut items = Vec::with_capacity(n.min(remaining));
                for _ in 0..n {
                    items.push(child.read(r, order)?);
                }
                Value::List(items)
            }
            Format::VarStr { len } => {
                let n = read_len(r, *len, order)?;
                Value::Str(utf8_trimmed(take(r, n)?)?)
            }
        })
    }

    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value, ValueError> {
        Ok(match self {
            Format::Int { ty, count: 1 } => int_json(ty.check(value)?),
            Format::Int { ty, count } => {
                let items = expect_list(value)?;
                if items.len() != *count {
                    return Err(ValueError::ArrayLength {
                        expected: *count,
                        found: items.len(),
                    });
                }
                items
                    .iter()
                    .map(|v| ty.check(v).map(int_json))
                    .collect::<Result<Vec<_>, _>>()?
                    .into()
            }
            Format::Bool => serde_json::Value::Bool(value.as_bool().ok_or(ValueError::TypeMismatch {
                expected: "bool",
                found: value.kind(),
            })?),
            Format::FixedStr(_) | Format::FixedHex { .. } | Format::VarStr { .. } => {
                serde_json::Value::String(expect_str(value)?.to_string())
            }
            Format::VarArray { child, .. } => expect_list(value)?
                .iter()
                .map(|v| child.to_json(v))
                .collect::<Result<Vec<_>, _>>()?
                .into(),
        })
    }

    pub fn from_json(&self, json: &serde_json::Value) -> Result<Value, ValueError> {
        Ok(match self {
            Format::Int { ty, count: 1 } => int_from_json(*ty, json)?,
            Format::Int { ty, count } => {
                let items = expect_json_array(json)?;
                if items.len() != *count {
                    return Err(ValueError::ArrayLength {
                        expected: *count,
                        found: items.len(),
                    });
                }
                Value::List(
                    items
                        .iter()
                        .map(|j| int_from_json(*ty, j))
                        .collect::<Result<_, _>>()?,
                )
            }
            Format::Bool => Value::Bool(json.as_bool().ok_or(ValueError::TypeMismatch {
                expected: "bool",
                found: json_kind(json),
            })?),
            Format::FixedStr(_) | Format::VarStr { .. } => Value::Str(expect_json_str(json)?.to_string()),
            Format::FixedHex { len, sep } => {
                let raw = parse_hex(expect_json_str(json)?, *len, sep)?;
                Value::Str(format_hex(&raw, sep))
            }
            Format::VarArray { child, len } => {
                let items = expect_json_array(json)?;
                if items.len() as i128 > len.max() {
                    return Err(ValueError::TooLong {
                        len: items.len(),
                        prefix: *len,
                    });
                }
                Value::List(
                    items
                        .iter()
                        .map(|j| child.from_json(j))
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }

    /// C declaration split around the member name: `(type, suffix)`.
    /// Variable kinds yield only their flexible `[0]` member.
    pub fn c_parts(&self) -> (String, String) {
        match self {
            Format::Int { ty, count: 1 } => (ty.c_type().to_string(), String::new()),
            Format::Int { ty, count } => (ty.c_type().to_string(), format!("[{}]", count)),
            Format::Bool => ("uint8_t".to_string(), String::new()),
            Format::FixedStr(n) => ("char".to_string(), format!("[{}]", n)),
            Format::FixedHex { len, .. } => ("uint8_t".to_string(), format!("[{}]", len)),
            Format::VarArray { child, len } => {
                let (pre, post) = child.c_parts();
                (pre, format!("[0]{}", post))
            }
            Format::VarStr { .. } => ("char".to_string(), "[0]".to_string()),
        }
    }

    /// Member declaration(s) for a field. Variable kinds get a `<name>_num`
    /// length member in front of the flexible member.
    pub fn c_code(&self, name: &str) -> String {
        let (pre, post) = self.c_parts();
        match self {
            Format::VarArray { len, .. } | Format::VarStr { len } => {
                format!("{} {}_num;\n{} {}{};", len.c_type(), name, pre, name, post)
            }
            _ => format!("{} {}{};", pre, name, post),
        }
    }
}

fn check_prefix(len: IntType) -> Result<(), String> {
    match len {
        IntType::U8 | IntType::U16 | IntType::U32 => Ok(()),
        other => Err(format!("length prefix must be u8, u16 or u32, not {}", other)),
    }
}

/// Fail with a size error unless `needed` bytes remain.
pub(crate) fn ensure(r: &Cursor<&[u8]>, needed: usize) -> Result<(), DecodingError> {
    let available = r.get_ref().len().saturating_sub(r.position() as usize);
    if available < needed {
        return Err(DecodingError::Truncated { needed, available });
    }
    Ok(())
}

fn take<'a>(r: &mut Cursor<&'a [u8]>, n: usize) -> Result<&'a [u8], DecodingError> {
    ensure(r, n)?;
    let data: &'a [u8] = *r.get_ref();
    let start = r.position() as usize;
    r.set_position((start + n) as u64);
    Ok(&data[start..start + n])
}

fn read_int(r: &mut Cursor<&[u8]>, ty: IntType, order: Endianness) -> Result<Value, DecodingError> {
    ensure(r, ty.size())?;
    match order {
        Endianness::Little => read_int_with::<LittleEndian>(r, ty),
        Endianness::Big => read_int_with::<BigEndian>(r, ty),
    }
}

fn read_int_with<B: ByteOrder>(r: &mut Cursor<&[u8]>, ty: IntType) -> Result<Value, DecodingError> {
    Ok(match ty {
        IntType::U8 => Value::U8(r.read_u8()?),
        IntType::U16 => Value::U16(r.read_u16::<B>()?),
        IntType::U32 => Value::U32(r.read_u32::<B>()?),
        IntType::U64 => Value::U64(r.read_u64::<B>()?),
        IntType::I8 => Value::I8(r.read_i8()?),
        IntType::I16 => Value::I16(r.read_i16::<B>()?),
        IntType::I32 => Value::I32(r.read_i32::<B>()?),
        IntType::I64 => Value::I64(r.read_i64::<B>()?),
    })
}

fn read_len(r: &mut Cursor<&[u8]>, ty: IntType, order: Endianness) -> Result<usize, DecodingError> {
    let v = read_int(r, ty, order)?;
    // Prefixes are unsigned and at most 32 bits wide (checked at definition time).
    Ok(v.as_u64().unwrap_or(0) as usize)
}

fn write_int(out: &mut Vec<u8>, ty: IntType, n: i128, order: Endianness) {
    match order {
        Endianness::Little => write_int_with::<LittleEndian>(out, ty, n),
        Endianness::Big => write_int_with::<BigEndian>(out, ty, n),
    }
}

fn write_int_with<B: ByteOrder>(out: &mut Vec<u8>, ty: IntType, n: i128) {
    let mut buf = [0u8; 8];
    match ty {
        IntType::U8 => buf[0] = n as u8,
        IntType::I8 => buf[0] = n as i8 as u8,
        IntType::U16 => B::write_u16(&mut buf, n as u16),
        IntType::I16 => B::write_i16(&mut buf, n as i16),
        IntType::U32 => B::write_u32(&mut buf, n as u32),
        IntType::I32 => B::write_i32(&mut buf, n as i32),
        IntType::U64 => B::write_u64(&mut buf, n as u64),
        IntType::I64 => B::write_i64(&mut buf, n as i64),
    }
    out.extend_from_slice(&buf[..ty.size()]);
}

fn write_len(out: &mut Vec<u8>, ty: IntType, len: usize, order: Endianness) -> Result<(), ValueError> {
    if len as i128 > ty.max() {
        return Err(ValueError::TooLong { len, prefix: ty });
    }
    write_int(out, ty, len as i128, order);
    Ok(())
}

fn expect_list(v: &Value) -> Result<&[Value], ValueError> {
    v.as_list().ok_or(ValueError::TypeMismatch {
        expected: "list",
        found: v.kind(),
    })
}

fn expect_str(v: &Value) -> Result<&str, ValueError> {
    v.as_str().ok_or(ValueError::TypeMismatch {
        expected: "string",
        found: v.kind(),
    })
}

fn expect_json_array(j: &serde_json::Value) -> Result<&Vec<serde_json::Value>, ValueError> {
    j.as_array().ok_or(ValueError::TypeMismatch {
        expected: "array",
        found: json_kind(j),
    })
}

fn expect_json_str(j: &serde_json::Value) -> Result<&str, ValueError> {
    j.as_str().ok_or(ValueError::TypeMismatch {
        expected: "string",
        found: json_kind(j),
    })
}

pub(crate) fn json_kind(j: &serde_json::Value) -> &'static str {
    match j {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn int_json(n: i128) -> serde_json::Value {
    if n < 0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Value::from(n as u64)
    }
}

fn int_from_json(ty: IntType, j: &serde_json::Value) -> Result<Value, ValueError> {
    let n = j
        .as_u64()
        .map(i128::from)
        .or_else(|| j.as_i64().map(i128::from))
        .ok_or(ValueError::TypeMismatch {
            expected: ty.name(),
            found: json_kind(j),
        })?;
    Ok(ty.make_value(ty.check_raw(n)?))
}

/// Longest prefix of `s` that fits in `n` bytes without splitting a character.
fn truncate_utf8(s: &str, n: usize) -> &[u8] {
    if s.len() <= n {
        return s.as_bytes();
    }
    let mut end = n;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}

fn utf8_trimmed(bytes: &[u8]) -> Result<String, DecodingError> {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    Ok(String::from_utf8(bytes[..end].to_vec())?)
}

fn parse_hex(s: &str, len: usize, sep: &str) -> Result<Vec<u8>, ValueError> {
    let digits: String = s.chars().filter(|c| *c != ':' && !sep.contains(*c)).collect();
    let raw = hex::decode(&digits).map_err(|_| ValueError::InvalidHex(s.to_string()))?;
    if raw.len() != len {
        return Err(ValueError::ArrayLength {
            expected: len,
            found: raw.len(),
        });
    }
    Ok(raw)
}

fn format_hex(bytes: &[u8], sep: &str) -> String {
    if sep.is_empty() {
        return hex::encode(bytes);
    }
    bytes.iter().map(|b| hex::encode([*b])).collect::<Vec<_>>().join(sep)
}
