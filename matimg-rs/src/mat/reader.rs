//! Level 5 MAT stream decoder.
//!
//! A Level 5 file is a 128-byte header followed by a flat sequence of tagged
//! data elements. Each variable is one `miMATRIX` element, optionally wrapped
//! in a zlib-compressed `miCOMPRESSED` element (v7). Matrices nest: cells and
//! structs hold further `miMATRIX` elements.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

use crate::data_type::{DataType, MatClass};
use crate::error::{Error, Result};
use super::data::{
    element_count, CellArray, CharArray, MatValue, NumericArray, NumericData, StructArray,
};

/// Size of the fixed file header.
pub(crate) const HEADER_LEN: usize = 128;

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";

/// Largest expansion accepted from one compressed element.
const MAX_INFLATE_RATIO: u64 = 256;

/// Compressed elements may always inflate to at least this many bytes.
const MIN_INFLATE_LIMIT: u64 = 16 * 1024 * 1024;

// Array flag bits (second byte of the first flags word).
const FLAG_COMPLEX: u32 = 0x08;
const FLAG_GLOBAL: u32 = 0x04;
const FLAG_LOGICAL: u32 = 0x02;

/// Decode a byte slice into primitives of type `$t`.
macro_rules! decode {
    ($bytes:expr, $order:expr, $t:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                match $order {
                    ByteOrder::Little => <$t>::from_le_bytes(raw),
                    ByteOrder::Big => <$t>::from_be_bytes(raw),
                }
            })
            .collect::<Vec<$t>>()
    }};
}

/// Byte order declared by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Written on a little-endian machine (`IM` indicator).
    Little,
    /// Written on a big-endian machine (`MI` indicator).
    Big,
}

/// Decoded file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatHeader {
    /// Descriptive text, e.g. `MATLAB 5.0 MAT-file, Platform: ...`.
    pub text: String,
    /// Header version word (0x0100 for Level 5).
    pub version: u16,
    /// Byte order of every following element.
    pub byte_order: ByteOrder,
}

/// One top-level variable.
#[derive(Debug, Clone)]
pub(crate) struct ParsedVariable {
    pub name: String,
    pub value: MatValue,
    pub global: bool,
}

/// Parse a complete MAT file held in memory.
pub(crate) fn parse(bytes: &[u8]) -> Result<(MatHeader, Vec<ParsedVariable>)> {
    let header = parse_header(bytes)?;
    let mut reader = ElementReader::new(&bytes[HEADER_LEN..], header.byte_order);
    let mut variables = Vec::new();

    while reader.remaining() >= 8 {
        let element = reader.read_element()?;
        match element.data_type {
            DataType::Matrix => {
                variables.push(parse_matrix(element.data, header.byte_order)?);
            }
            DataType::Compressed => {
                let inflated = inflate(element.data)?;
                let mut inner = ElementReader::new(&inflated, header.byte_order);
                let element = inner.read_element()?;
                if element.data_type != DataType::Matrix {
                    warn!("Skipping compressed {} element", element.data_type);
                    continue;
                }
                variables.push(parse_matrix(element.data, header.byte_order)?);
            }
            other => {
                warn!("Skipping top-level {} element", other);
            }
        }
    }

    Ok((header, variables))
}

fn parse_header(bytes: &[u8]) -> Result<MatHeader> {
    if bytes.starts_with(HDF5_SIGNATURE) {
        return Err(Error::unsupported_format(
            "HDF5-based v7.3 MAT files are not supported (re-save with '-v7')",
        ));
    }
    if bytes.len() < HEADER_LEN {
        return Err(Error::invalid_format(format!(
            "file is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let byte_order = match &bytes[126..128] {
        b"IM" => ByteOrder::Little,
        b"MI" => ByteOrder::Big,
        _ => {
            return Err(Error::unsupported_format(
                "missing Level 5 endian indicator (Level 4 MAT files are not supported)",
            ))
        }
    };

    let version_bytes = [bytes[124], bytes[125]];
    let version = match byte_order {
        ByteOrder::Little => u16::from_le_bytes(version_bytes),
        ByteOrder::Big => u16::from_be_bytes(version_bytes),
    };
    if version == 0x0200 {
        return Err(Error::unsupported_format(
            "HDF5-based v7.3 MAT files are not supported (re-save with '-v7')",
        ));
    }

    let text = String::from_utf8_lossy(&bytes[..116])
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string();

    Ok(MatHeader {
        text,
        version,
        byte_order,
    })
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let limit = (data.len() as u64)
        .saturating_mul(MAX_INFLATE_RATIO)
        .max(MIN_INFLATE_LIMIT);
    inflate_with_limit(data, limit)
}

fn inflate_with_limit(data: &[u8], limit: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| Error::invalid_format(format!("corrupt compressed element: {}", e)))?;
    if out.len() as u64 > limit {
        return Err(Error::invalid_format(format!(
            "compressed element of {} bytes inflates beyond {} bytes",
            data.len(),
            limit
        )));
    }
    Ok(out)
}

/// A tagged data element borrowed from the stream.
struct Element<'a> {
    data_type: DataType,
    data: &'a [u8],
}

/// Cursor over a sequence of tagged elements.
struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ElementReader<'a> {
    fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        ElementReader { buf, pos: 0, order }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::invalid_format(format!(
                "element needs {} bytes but only {} remain",
                n,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        let b = [b[0], b[1], b[2], b[3]];
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }

    fn read_element(&mut self) -> Result<Element<'a>> {
        let first = self.u32()?;

        // Small data element: type and length packed into one word, data
        // in the following four bytes.
        if first >> 16 != 0 {
            let len = (first >> 16) as usize;
            let data_type = data_type(first & 0xFFFF)?;
            if len > 4 {
                return Err(Error::invalid_format(format!(
                    "small {} element claims {} bytes",
                    data_type, len
                )));
            }
            let data = self.take(4)?;
            return Ok(Element {
                data_type,
                data: &data[..len],
            });
        }

        let data_type = data_type(first)?;
        let len = self.u32()? as usize;
        let data = self.take(len)?;

        // Everything except compressed elements is padded to 8 bytes.
        if data_type != DataType::Compressed {
            let pad = (8 - len % 8) % 8;
            self.pos = (self.pos + pad).min(self.buf.len());
        }

        Ok(Element { data_type, data })
    }

    fn require(&mut self, what: &str) -> Result<Element<'a>> {
        if self.remaining() == 0 {
            return Err(Error::invalid_format(format!(
                "array ended before its {}",
                what
            )));
        }
        self.read_element()
    }
}

fn data_type(raw: u32) -> Result<DataType> {
    DataType::from_raw(raw)
        .ok_or_else(|| Error::invalid_format(format!("unknown data element type {}", raw)))
}

/// Parse the body of an `miMATRIX` element.
fn parse_matrix(data: &[u8], order: ByteOrder) -> Result<ParsedVariable> {
    // A zero-length matrix is how MATLAB writes `[]` inside cells.
    if data.is_empty() {
        return Ok(ParsedVariable {
            name: String::new(),
            value: MatValue::Numeric(NumericArray::new(vec![0, 0], NumericData::Double(Vec::new()))?),
            global: false,
        });
    }

    let mut r = ElementReader::new(data, order);

    let flags = r.require("array flags")?;
    if flags.data.len() < 4 {
        return Err(Error::invalid_format("array flags element is too short"));
    }
    let word = decode_u32(&flags.data[..4], order)[0];
    let bits = (word >> 8) & 0xFF;
    let raw_class = (word & 0xFF) as u8;
    let class = MatClass::from_raw(raw_class)
        .ok_or_else(|| Error::invalid_format(format!("unknown array class {}", raw_class)))?;
    let global = bits & FLAG_GLOBAL != 0;

    // Opaque arrays (strings, tables) carry no dimensions element.
    if class == MatClass::Opaque {
        let name = read_name(&mut r)?;
        debug!("Variable '{}' has opaque class, not decoded", name);
        return Ok(ParsedVariable {
            name,
            value: MatValue::Unsupported {
                class,
                dims: vec![1, 1],
            },
            global,
        });
    }

    let dims = read_dims(&mut r)?;
    let name = read_name(&mut r)?;

    let value = match class {
        c if c.is_numeric() => {
            let real = read_numeric(&mut r, c, "real part")?;
            let mut array = NumericArray::new(dims, real)?.logical(bits & FLAG_LOGICAL != 0);
            if bits & FLAG_COMPLEX != 0 {
                array = array.with_imag(read_numeric(&mut r, c, "imaginary part")?)?;
            }
            MatValue::Numeric(array)
        }
        MatClass::Char => {
            let chars = if r.remaining() == 0 {
                Vec::new()
            } else {
                decode_chars(&r.read_element()?, order)?
            };
            MatValue::Char(CharArray::new(dims, chars))
        }
        MatClass::Cell => {
            let count = element_count(&dims)?;
            // Every nested element takes at least one 8-byte tag.
            let mut elements = Vec::with_capacity(count.min(r.remaining() / 8));
            for _ in 0..count {
                elements.push(read_nested(&mut r, order)?);
            }
            MatValue::Cell(CellArray::new(dims, elements)?)
        }
        MatClass::Struct => {
            let field_names = read_field_names(&mut r, order)?;
            let count = element_count(&dims)?
                .checked_mul(field_names.len())
                .ok_or_else(|| Error::invalid_format("struct field count overflows"))?;
            let mut values = Vec::with_capacity(count.min(r.remaining() / 8));
            for _ in 0..count {
                values.push(read_nested(&mut r, order)?);
            }
            MatValue::Struct(StructArray::new(dims, field_names, values)?)
        }
        _ => {
            debug!("Variable '{}' has class {}, not decoded", name, class);
            MatValue::Unsupported { class, dims }
        }
    };

    Ok(ParsedVariable {
        name,
        value,
        global,
    })
}

fn read_nested(r: &mut ElementReader<'_>, order: ByteOrder) -> Result<MatValue> {
    let element = r.require("nested array")?;
    if element.data_type != DataType::Matrix {
        return Err(Error::invalid_format(format!(
            "expected nested miMATRIX, found {}",
            element.data_type
        )));
    }
    Ok(parse_matrix(element.data, order)?.value)
}

fn read_dims(r: &mut ElementReader<'_>) -> Result<Vec<usize>> {
    let element = r.require("dimensions")?;
    if element.data_type != DataType::Int32 {
        return Err(Error::invalid_format(format!(
            "dimensions stored as {}, expected miINT32",
            element.data_type
        )));
    }
    decode_i32(element.data, r.order)
        .into_iter()
        .map(|d| {
            usize::try_from(d)
                .map_err(|_| Error::invalid_format(format!("negative dimension {}", d)))
        })
        .collect()
}

fn read_name(r: &mut ElementReader<'_>) -> Result<String> {
    let element = r.require("name")?;
    Ok(String::from_utf8_lossy(element.data)
        .trim_end_matches('\0')
        .to_string())
}

fn read_field_names(r: &mut ElementReader<'_>, order: ByteOrder) -> Result<Vec<String>> {
    let len_element = r.require("field name length")?;
    let width = decode_i32(len_element.data, order)
        .first()
        .copied()
        .filter(|&w| w > 0)
        .ok_or_else(|| Error::invalid_format("invalid struct field name length"))?
        as usize;

    let names = r.require("field names")?;
    Ok(names
        .data
        .chunks(width)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            String::from_utf8_lossy(&chunk[..end]).into_owned()
        })
        .collect())
}

fn read_numeric(r: &mut ElementReader<'_>, class: MatClass, what: &str) -> Result<NumericData> {
    let element = r.require(what)?;
    let order = r.order;
    let bytes = element.data;
    let data_type = element.data_type;

    if data_type.size_bytes() == 0 || bytes.len() % data_type.size_bytes() != 0 {
        return Err(Error::invalid_format(format!(
            "{} stored as {} with {} bytes",
            what,
            data_type,
            bytes.len()
        )));
    }

    let stored = match data_type {
        DataType::Double => NumericData::Double(decode!(bytes, order, f64)),
        DataType::Single => NumericData::Single(decode!(bytes, order, f32)),
        DataType::Int8 => NumericData::Int8(decode!(bytes, order, i8)),
        DataType::UInt8 | DataType::Utf8 => NumericData::UInt8(bytes.to_vec()),
        DataType::Int16 => NumericData::Int16(decode!(bytes, order, i16)),
        DataType::UInt16 | DataType::Utf16 => NumericData::UInt16(decode!(bytes, order, u16)),
        DataType::Int32 => NumericData::Int32(decode!(bytes, order, i32)),
        DataType::UInt32 | DataType::Utf32 => NumericData::UInt32(decode!(bytes, order, u32)),
        DataType::Int64 => NumericData::Int64(decode!(bytes, order, i64)),
        DataType::UInt64 => NumericData::UInt64(decode!(bytes, order, u64)),
        DataType::Matrix | DataType::Compressed => unreachable!("zero-width types rejected above"),
    };

    Ok(stored.cast(class))
}

fn decode_chars(element: &Element<'_>, order: ByteOrder) -> Result<Vec<char>> {
    let bytes = element.data;
    Ok(match element.data_type {
        DataType::Utf8 => String::from_utf8_lossy(bytes).chars().collect(),
        DataType::UInt8 | DataType::Int8 => bytes.iter().map(|&b| b as char).collect(),
        DataType::UInt16 | DataType::Utf16 => {
            char::decode_utf16(decode!(bytes, order, u16))
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        DataType::UInt32 | DataType::Utf32 => decode!(bytes, order, u32)
            .into_iter()
            .map(|u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        other => {
            return Err(Error::invalid_format(format!(
                "character data stored as {}",
                other
            )))
        }
    })
}

fn decode_u32(bytes: &[u8], order: ByteOrder) -> Vec<u32> {
    decode!(bytes, order, u32)
}

fn decode_i32(bytes: &[u8], order: ByteOrder) -> Vec<i32> {
    decode!(bytes, order, i32)
}
