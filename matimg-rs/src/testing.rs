//! Level 5 MAT writer for building test fixtures.
//!
//! Only compiled for tests or with the `test-util` feature. It writes the
//! same element layout MATLAB does (8-byte padding, small name elements,
//! optional zlib compression per variable) so fixtures exercise the real
//! decoding paths.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::ArrayD;

use crate::data_type::{DataType, MatClass};

/// A value to be written into a fixture.
#[derive(Debug, Clone)]
pub enum TestValue {
    /// `double` array stored as `miDOUBLE`.
    Double {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<f64>,
    },
    /// `double` array stored compactly as `miUINT8`, as MATLAB does when
    /// every value fits.
    DoubleCompact {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<u8>,
    },
    /// `single` array.
    Single {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<f32>,
    },
    /// `uint8` array.
    UInt8 {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<u8>,
    },
    /// `uint16` array.
    UInt16 {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<u16>,
    },
    /// `logical` array.
    Logical {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major data.
        data: Vec<bool>,
    },
    /// `1xN` char array.
    Char(String),
    /// Cell array.
    Cell {
        /// Dimensions.
        dims: Vec<usize>,
        /// Column-major elements.
        elements: Vec<TestValue>,
    },
    /// Struct array.
    Struct {
        /// Dimensions.
        dims: Vec<usize>,
        /// Field names.
        fields: Vec<String>,
        /// Element-major field values.
        values: Vec<TestValue>,
    },
}

impl TestValue {
    /// `double` array from column-major data.
    pub fn double(dims: &[usize], data: &[f64]) -> Self {
        TestValue::Double {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `double` array stored as `miUINT8`.
    pub fn double_compact(dims: &[usize], data: &[u8]) -> Self {
        TestValue::DoubleCompact {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `single` array from column-major data.
    pub fn single(dims: &[usize], data: &[f32]) -> Self {
        TestValue::Single {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `uint8` array from column-major data.
    pub fn uint8(dims: &[usize], data: &[u8]) -> Self {
        TestValue::UInt8 {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `uint16` array from column-major data.
    pub fn uint16(dims: &[usize], data: &[u16]) -> Self {
        TestValue::UInt16 {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `logical` array from column-major data.
    pub fn logical(dims: &[usize], data: &[bool]) -> Self {
        TestValue::Logical {
            dims: dims.to_vec(),
            data: data.to_vec(),
        }
    }

    /// `1xN` char array.
    pub fn char(text: &str) -> Self {
        TestValue::Char(text.to_string())
    }

    /// Cell array from column-major elements.
    pub fn cell(dims: &[usize], elements: Vec<TestValue>) -> Self {
        TestValue::Cell {
            dims: dims.to_vec(),
            elements,
        }
    }

    /// Struct array; `values` holds each element's fields in order.
    pub fn structure(dims: &[usize], fields: &[&str], values: Vec<TestValue>) -> Self {
        TestValue::Struct {
            dims: dims.to_vec(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            values,
        }
    }

    /// `uint8` array from an ndarray indexed like MATLAB.
    pub fn uint8_array(array: &ArrayD<u8>) -> Self {
        TestValue::UInt8 {
            dims: array.shape().to_vec(),
            data: array.t().iter().copied().collect(),
        }
    }

    /// `double` array from an ndarray indexed like MATLAB.
    pub fn double_array(array: &ArrayD<f64>) -> Self {
        TestValue::Double {
            dims: array.shape().to_vec(),
            data: array.t().iter().copied().collect(),
        }
    }

    /// A `1xN` cell of `n` copies of an `h x w x 3` uint8 gradient image.
    pub fn rgb_frames(n: usize, h: usize, w: usize) -> Self {
        let frame = ArrayD::from_shape_fn(vec![h, w, 3], |ix| ((ix[0] * 7 + ix[1] * 3 + ix[2] * 50) % 256) as u8);
        TestValue::cell(&[1, n], vec![TestValue::uint8_array(&frame); n])
    }
}

/// Builder for an in-memory Level 5 MAT file.
#[derive(Debug, Clone, Default)]
pub struct MatBuilder {
    variables: Vec<(String, TestValue, bool)>,
    compress: bool,
    big_endian: bool,
}

impl MatBuilder {
    /// Create an empty, uncompressed little-endian file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn var(mut self, name: &str, value: TestValue) -> Self {
        self.variables.push((name.to_string(), value, false));
        self
    }

    /// Add a variable flagged as global.
    pub fn global_var(mut self, name: &str, value: TestValue) -> Self {
        self.variables.push((name.to_string(), value, true));
        self
    }

    /// Wrap every variable in a zlib-compressed element (v7 style).
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Write big-endian (`MI`) instead of little-endian.
    pub fn big_endian(mut self, big: bool) -> Self {
        self.big_endian = big;
        self
    }

    /// Serialize the file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let w = Writer { big: self.big_endian };
        let mut out = Vec::new();

        let mut text = b"MATLAB 5.0 MAT-file, Platform: matimg-rs test fixture".to_vec();
        text.resize(116, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&w.u16(0x0100));
        out.extend_from_slice(if self.big_endian { b"MI" } else { b"IM" });

        for (name, value, global) in &self.variables {
            let matrix = w.matrix(name, value, *global);
            if self.compress {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&matrix).expect("in-memory write");
                let packed = encoder.finish().expect("in-memory write");
                out.extend_from_slice(&w.u32(DataType::Compressed as u32));
                out.extend_from_slice(&w.u32(packed.len() as u32));
                out.extend_from_slice(&packed);
            } else {
                out.extend_from_slice(&matrix);
            }
        }

        out
    }

    /// Serialize the file to disk.
    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.to_bytes())
    }
}

struct Writer {
    big: bool,
}

impl Writer {
    fn u16(&self, v: u16) -> [u8; 2] {
        if self.big { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    fn u32(&self, v: u32) -> [u8; 4] {
        if self.big { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    /// Tagged element with 8-byte padding.
    fn element(&self, data_type: DataType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + data.len() + 8);
        out.extend_from_slice(&self.u32(data_type as u32));
        out.extend_from_slice(&self.u32(data.len() as u32));
        out.extend_from_slice(data);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    /// Small element format, for payloads of 1 to 4 bytes.
    fn small_element(&self, data_type: DataType, data: &[u8]) -> Vec<u8> {
        let mut out = self.u32(((data.len() as u32) << 16) | data_type as u32).to_vec();
        let mut payload = [0u8; 4];
        payload[..data.len()].copy_from_slice(data);
        out.extend_from_slice(&payload);
        out
    }

    fn matrix(&self, name: &str, value: &TestValue, global: bool) -> Vec<u8> {
        let (class, logical, dims) = match value {
            TestValue::Double { dims, .. } | TestValue::DoubleCompact { dims, .. } => {
                (MatClass::Double, false, dims.clone())
            }
            TestValue::Single { dims, .. } => (MatClass::Single, false, dims.clone()),
            TestValue::UInt8 { dims, .. } => (MatClass::UInt8, false, dims.clone()),
            TestValue::UInt16 { dims, .. } => (MatClass::UInt16, false, dims.clone()),
            TestValue::Logical { dims, .. } => (MatClass::UInt8, true, dims.clone()),
            TestValue::Char(text) => (MatClass::Char, false, vec![1, text.encode_utf16().count()]),
            TestValue::Cell { dims, .. } => (MatClass::Cell, false, dims.clone()),
            TestValue::Struct { dims, .. } => (MatClass::Struct, false, dims.clone()),
        };

        let mut bits = 0u32;
        if global {
            bits |= 0x04;
        }
        if logical {
            bits |= 0x02;
        }

        let mut body = Vec::new();
        let mut flags = self.u32(class as u32 | (bits << 8)).to_vec();
        flags.extend_from_slice(&self.u32(0));
        body.extend(self.element(DataType::UInt32, &flags));

        let dims_bytes: Vec<u8> = dims.iter().flat_map(|&d| self.u32(d as u32)).collect();
        body.extend(self.element(DataType::Int32, &dims_bytes));

        if (1..=4).contains(&name.len()) {
            body.extend(self.small_element(DataType::Int8, name.as_bytes()));
        } else {
            body.extend(self.element(DataType::Int8, name.as_bytes()));
        }

        match value {
            TestValue::Double { data, .. } => {
                let bytes: Vec<u8> = data
                    .iter()
                    .flat_map(|v| if self.big { v.to_be_bytes() } else { v.to_le_bytes() })
                    .collect();
                body.extend(self.element(DataType::Double, &bytes));
            }
            TestValue::DoubleCompact { data, .. } | TestValue::UInt8 { data, .. } => {
                body.extend(self.element(DataType::UInt8, data));
            }
            TestValue::Single { data, .. } => {
                let bytes: Vec<u8> = data
                    .iter()
                    .flat_map(|v| if self.big { v.to_be_bytes() } else { v.to_le_bytes() })
                    .collect();
                body.extend(self.element(DataType::Single, &bytes));
            }
            TestValue::UInt16 { data, .. } => {
                let bytes: Vec<u8> = data.iter().flat_map(|&v| self.u16(v)).collect();
                body.extend(self.element(DataType::UInt16, &bytes));
            }
            TestValue::Logical { data, .. } => {
                let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
                body.extend(self.element(DataType::UInt8, &bytes));
            }
            TestValue::Char(text) => {
                let bytes: Vec<u8> = text.encode_utf16().flat_map(|u| self.u16(u)).collect();
                body.extend(self.element(DataType::UInt16, &bytes));
            }
            TestValue::Cell { elements, .. } => {
                for element in elements {
                    body.extend(self.matrix("", element, false));
                }
            }
            TestValue::Struct { fields, values, .. } => {
                const WIDTH: usize = 32;
                body.extend(self.small_element(DataType::Int32, &self.u32(WIDTH as u32)));
                let mut names = vec![0u8; fields.len() * WIDTH];
                for (i, field) in fields.iter().enumerate() {
                    names[i * WIDTH..i * WIDTH + field.len()].copy_from_slice(field.as_bytes());
                }
                body.extend(self.element(DataType::Int8, &names));
                for value in values {
                    body.extend(self.matrix("", value, false));
                }
            }
        }

        self.element(DataType::Matrix, &body)
    }
}
