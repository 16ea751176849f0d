//! Order-preserving value encoding.
//!
//! Every value encodes as `[tag][payload]`. Tags order the type brackets
//! (absent < null < number < string < document < array < object id <
//! boolean < date) and payloads order values inside a bracket, so comparing
//! two encodings byte-wise gives the natural order of the values.
//!
//! Encodings are prefix-free: no encoded value is a proper prefix of another.
//! That lets index keys concatenate several encodings and still range-scan
//! on any leading subset.

use std::cmp::Ordering;

use bson::oid::ObjectId;
use bson::spec::ElementType;
use bson::{Bson, DateTime, Document};

pub mod tag {
    /// Lowest byte of all: a field that is not present.
    pub const ABSENT: u8 = 0x00;
    pub const NULL: u8 = 0x05;
    pub const NUMBER: u8 = 0x10;
    pub const STRING: u8 = 0x20;
    pub const DOCUMENT: u8 = 0x30;
    pub const ARRAY: u8 = 0x40;
    pub const OBJECT_ID: u8 = 0x50;
    pub const BOOLEAN: u8 = 0x60;
    pub const DATE: u8 = 0x70;
    pub const MAX: u8 = DATE;
}

/// Encoding of a missing field.
pub const ABSENT: &[u8] = &[tag::ABSENT];

const SIGN: u64 = 1 << 63;
const ENTRY: u8 = 0x01;
const END: u8 = 0x00;
const ESCAPE: u8 = 0xFF;
const STRING_END: u8 = 0x01;
// Integers above this lose precision as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("values of type {0:?} cannot be encoded")]
    Unsupported(ElementType),
    #[error("unexpected end of encoded value")]
    Truncated,
    #[error("unknown type tag {0:#04x}")]
    UnknownTag(u8),
    #[error("invalid utf-8 in encoded string")]
    InvalidUtf8,
    #[error("{0} trailing bytes after encoded value")]
    TrailingBytes(usize),
    #[error("the absent sentinel does not decode to a value")]
    Absent,
    #[error("encoded number is out of range")]
    InvalidNumber,
    #[error("bson: {0}")]
    Bson(#[from] bson::error::Error),
}

/// Encode a value into its order-preserving form.
pub fn encode(value: &Bson) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(16);
    encode_into(value, &mut out)?;
    Ok(out)
}

pub fn encode_into(value: &Bson, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    match value {
        Bson::Null => out.push(tag::NULL),
        Bson::Int32(n) => write_number(f64::from(*n), 0, out),
        Bson::Int64(n) => {
            let f = *n as f64;
            // `f` is integral and within ±2^63, so `f as i128` is exact.
            let residual = (i128::from(*n) - f as i128) as i64;
            write_number(f, residual, out)
        }
        Bson::Double(f) => write_number(*f, 0, out),
        Bson::String(s) => {
            out.push(tag::STRING);
            write_escaped(s.as_bytes(), out);
        }
        Bson::Document(doc) => {
            out.push(tag::DOCUMENT);
            for (key, value) in doc {
                out.push(ENTRY);
                write_escaped(key.as_bytes(), out);
                encode_into(value, out)?;
            }
            out.push(END);
        }
        Bson::Array(items) => {
            out.push(tag::ARRAY);
            for item in items {
                out.push(ENTRY);
                encode_into(item, out)?;
            }
            out.push(END);
        }
        Bson::ObjectId(oid) => {
            out.push(tag::OBJECT_ID);
            out.extend_from_slice(&oid.bytes());
        }
        Bson::Boolean(b) => {
            out.push(tag::BOOLEAN);
            out.push(u8::from(*b));
        }
        Bson::DateTime(dt) => {
            out.push(tag::DATE);
            out.extend_from_slice(&((dt.timestamp_millis() as u64) ^ SIGN).to_be_bytes());
        }
        other => return Err(EncodingError::Unsupported(other.element_type())),
    }
    Ok(())
}

/// Decode a single encoded value. The input must contain exactly one value.
///
/// Numbers come back in canonical form: integral values as `Int32` when they
/// fit, else `Int64` when exactly representable, else `Double`.
pub fn decode(bytes: &[u8]) -> Result<Bson, EncodingError> {
    let (value, used) = decode_prefix(bytes)?;
    match bytes.len() - used {
        0 => Ok(value),
        rest => Err(EncodingError::TrailingBytes(rest)),
    }
}

/// Decode the value at the start of `bytes`, returning it and its length.
pub fn decode_prefix(bytes: &[u8]) -> Result<(Bson, usize), EncodingError> {
    let mut reader = Reader { bytes, pos: 0 };
    let value = reader.value()?;
    Ok((value, reader.pos))
}

/// Natural order of two values: the order of their encodings.
pub fn compare(a: &Bson, b: &Bson) -> Result<Ordering, EncodingError> {
    Ok(encode(a)?.cmp(&encode(b)?))
}

/// The span of encodings that share a value's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket(u8);

impl Bracket {
    pub fn of(encoded: &[u8]) -> Self {
        Bracket(encoded.first().copied().unwrap_or(tag::ABSENT))
    }

    /// Inclusive lower bound of the bracket.
    pub fn lower(&self) -> Vec<u8> {
        vec![self.0]
    }

    /// Exclusive upper bound of the bracket.
    pub fn upper(&self) -> Vec<u8> {
        vec![self.0 + 1]
    }

    pub fn contains(&self, encoded: &[u8]) -> bool {
        encoded.first() == Some(&self.0)
    }
}

/// Type bracket of a value.
pub fn bracket(value: &Bson) -> Result<Bracket, EncodingError> {
    let mut out = Vec::new();
    encode_into(value, &mut out)?;
    Ok(Bracket::of(&out))
}

/// The nearest f64, then the signed distance from it to the exact value.
/// Only Int64 beyond 2^53 has a non-zero residual.
fn write_number(f: f64, residual: i64, out: &mut Vec<u8>) {
    // One bit pattern each for zero and NaN so equal numbers encode equally.
    let f = if f == 0.0 {
        0.0
    } else if f.is_nan() {
        f64::NAN
    } else {
        f
    };
    let bits = f.to_bits();
    let sortable = if bits & SIGN != 0 { !bits } else { bits ^ SIGN };
    out.push(tag::NUMBER);
    out.extend_from_slice(&sortable.to_be_bytes());
    out.extend_from_slice(&((residual as u64) ^ SIGN).to_be_bytes());
}

fn write_escaped(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        out.push(b);
        if b == 0x00 {
            out.push(ESCAPE);
        }
    }
    out.push(0x00);
    out.push(STRING_END);
}

fn canonical_number(f: f64) -> Bson {
    if f.is_finite() && f.fract() == 0.0 {
        if f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
            return Bson::Int32(f as i32);
        }
        if f.abs() <= MAX_SAFE_INTEGER {
            return Bson::Int64(f as i64);
        }
    }
    Bson::Double(f)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn byte(&mut self) -> Result<u8, EncodingError> {
        let b = *self.bytes.get(self.pos).ok_or(EncodingError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], EncodingError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(EncodingError::Truncated)?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn escaped(&mut self) -> Result<String, EncodingError> {
        let mut raw = Vec::new();
        loop {
            match self.byte()? {
                0x00 => match self.byte()? {
                    ESCAPE => raw.push(0x00),
                    STRING_END => break,
                    other => return Err(EncodingError::UnknownTag(other)),
                },
                b => raw.push(b),
            }
        }
        String::from_utf8(raw).map_err(|_| EncodingError::InvalidUtf8)
    }

    /// True when another entry follows, false at the container terminator.
    fn entry(&mut self) -> Result<bool, EncodingError> {
        match self.byte()? {
            ENTRY => Ok(true),
            END => Ok(false),
            other => Err(EncodingError::UnknownTag(other)),
        }
    }

    fn value(&mut self) -> Result<Bson, EncodingError> {
        let value = match self.byte()? {
            tag::ABSENT => return Err(EncodingError::Absent),
            tag::NULL => Bson::Null,
            tag::NUMBER => {
                let sortable = u64::from_be_bytes(self.take::<8>()?);
                let bits = if sortable & SIGN != 0 {
                    sortable ^ SIGN
                } else {
                    !sortable
                };
                let f = f64::from_bits(bits);
                let residual = (u64::from_be_bytes(self.take::<8>()?) ^ SIGN) as i64;
                if residual == 0 {
                    canonical_number(f)
                } else if f.is_finite() {
                    let exact = f as i128 + i128::from(residual);
                    Bson::Int64(i64::try_from(exact).map_err(|_| EncodingError::InvalidNumber)?)
                } else {
                    return Err(EncodingError::InvalidNumber);
                }
            }
            tag::STRING => Bson::String(self.escaped()?),
            tag::DOCUMENT => {
                let mut doc = Document::new();
                while self.entry()? {
                    let key = self.escaped()?;
                    let value = self.value()?;
                    doc.insert(key, value);
                }
                Bson::Document(doc)
            }
            tag::ARRAY => {
                let mut items = Vec::new();
                while self.entry()? {
                    items.push(self.value()?);
                }
                Bson::Array(items)
            }
            tag::OBJECT_ID => Bson::ObjectId(ObjectId::from_bytes(self.take::<12>()?)),
            tag::BOOLEAN => match self.byte()? {
                0 => Bson::Boolean(false),
                1 => Bson::Boolean(true),
                other => return Err(EncodingError::UnknownTag(other)),
            },
            tag::DATE => {
                let millis = (u64::from_be_bytes(self.take::<8>()?) ^ SIGN) as i64;
                Bson::DateTime(DateTime::from_millis(millis))
            }
            other => return Err(EncodingError::UnknownTag(other)),
        };
        Ok(value)
    }
}
