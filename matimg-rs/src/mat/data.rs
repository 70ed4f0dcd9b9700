//! Decoded MAT variable representation.
//!
//! [`MatValue`] is the tagged union of everything a Level 5 file can hold.
//! Arrays keep MATLAB's dimensions exactly as stored; nothing is squeezed
//! at load time, so a `1x1` cell stays a cell.

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::data_type::MatClass;
use crate::error::{Error, Result};

/// A decoded MAT variable.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    /// Numeric or logical array.
    Numeric(NumericArray),
    /// Character array.
    Char(CharArray),
    /// Cell array of arbitrary values.
    Cell(CellArray),
    /// Struct array.
    Struct(StructArray),
    /// A class this crate does not decode (sparse, objects, handles).
    Unsupported {
        /// The class found in the array flags.
        class: MatClass,
        /// Stored dimensions.
        dims: Vec<usize>,
    },
}

impl MatValue {
    /// Stored dimensions of the value.
    pub fn dims(&self) -> &[usize] {
        match self {
            MatValue::Numeric(a) => a.dims(),
            MatValue::Char(a) => &a.dims,
            MatValue::Cell(a) => a.dims(),
            MatValue::Struct(a) => a.dims(),
            MatValue::Unsupported { dims, .. } => dims,
        }
    }

    /// MATLAB class of the value.
    pub fn class(&self) -> MatClass {
        match self {
            MatValue::Numeric(a) => a.class(),
            MatValue::Char(_) => MatClass::Char,
            MatValue::Cell(_) => MatClass::Cell,
            MatValue::Struct(_) => MatClass::Struct,
            MatValue::Unsupported { class, .. } => *class,
        }
    }

    /// Human readable type in MATLAB's `whos` style, e.g. `1x5 cell`.
    pub fn type_name(&self) -> String {
        let class = match self {
            MatValue::Numeric(a) if a.is_logical() => "logical",
            _ => self.class().name(),
        };
        format!("{} {}", format_dims(self.dims()), class)
    }
}

/// Format dimensions as `HxWxC`.
pub fn format_dims(dims: &[usize]) -> String {
    dims.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x")
}

/// Number of elements described by `dims`.
///
/// Dimensions come straight from the file, so the product is checked.
pub(crate) fn element_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            Error::invalid_format(format!(
                "dimensions {} exceed the addressable element count",
                format_dims(dims)
            ))
        })
}

/// Typed storage for numeric array elements, in MATLAB column-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    /// `double`
    Double(Vec<f64>),
    /// `single`
    Single(Vec<f32>),
    /// `int8`
    Int8(Vec<i8>),
    /// `uint8` (also used by `logical`)
    UInt8(Vec<u8>),
    /// `int16`
    Int16(Vec<i16>),
    /// `uint16`
    UInt16(Vec<u16>),
    /// `int32`
    Int32(Vec<i32>),
    /// `uint32`
    UInt32(Vec<u32>),
    /// `int64`
    Int64(Vec<i64>),
    /// `uint64`
    UInt64(Vec<u64>),
}

macro_rules! for_each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            NumericData::Double($v) => $body,
            NumericData::Single($v) => $body,
            NumericData::Int8($v) => $body,
            NumericData::UInt8($v) => $body,
            NumericData::Int16($v) => $body,
            NumericData::UInt16($v) => $body,
            NumericData::Int32($v) => $body,
            NumericData::UInt32($v) => $body,
            NumericData::Int64($v) => $body,
            NumericData::UInt64($v) => $body,
        }
    };
}

impl NumericData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        for_each_variant!(self, v => v.len())
    }

    /// Check if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// MATLAB class matching this storage.
    pub fn class(&self) -> MatClass {
        match self {
            NumericData::Double(_) => MatClass::Double,
            NumericData::Single(_) => MatClass::Single,
            NumericData::Int8(_) => MatClass::Int8,
            NumericData::UInt8(_) => MatClass::UInt8,
            NumericData::Int16(_) => MatClass::Int16,
            NumericData::UInt16(_) => MatClass::UInt16,
            NumericData::Int32(_) => MatClass::Int32,
            NumericData::UInt32(_) => MatClass::UInt32,
            NumericData::Int64(_) => MatClass::Int64,
            NumericData::UInt64(_) => MatClass::UInt64,
        }
    }

    /// Convert to the storage of `class`, with `as` cast semantics.
    ///
    /// Non-numeric classes leave the data untouched.
    pub(crate) fn cast(self, class: MatClass) -> NumericData {
        if self.class() == class {
            return self;
        }
        match class {
            MatClass::Double => NumericData::Double(for_each_variant!(self, v => v.into_iter().map(|x| x as f64).collect())),
            MatClass::Single => NumericData::Single(for_each_variant!(self, v => v.into_iter().map(|x| x as f32).collect())),
            MatClass::Int8 => NumericData::Int8(for_each_variant!(self, v => v.into_iter().map(|x| x as i8).collect())),
            MatClass::UInt8 => NumericData::UInt8(for_each_variant!(self, v => v.into_iter().map(|x| x as u8).collect())),
            MatClass::Int16 => NumericData::Int16(for_each_variant!(self, v => v.into_iter().map(|x| x as i16).collect())),
            MatClass::UInt16 => NumericData::UInt16(for_each_variant!(self, v => v.into_iter().map(|x| x as u16).collect())),
            MatClass::Int32 => NumericData::Int32(for_each_variant!(self, v => v.into_iter().map(|x| x as i32).collect())),
            MatClass::UInt32 => NumericData::UInt32(for_each_variant!(self, v => v.into_iter().map(|x| x as u32).collect())),
            MatClass::Int64 => NumericData::Int64(for_each_variant!(self, v => v.into_iter().map(|x| x as i64).collect())),
            MatClass::UInt64 => NumericData::UInt64(for_each_variant!(self, v => v.into_iter().map(|x| x as u64).collect())),
            _ => self,
        }
    }

    /// Widen every element to f64.
    ///
    /// 64-bit integers beyond 2^53 lose precision.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        for_each_variant!(self, v => v.iter().map(|&x| x as f64).collect())
    }
}

/// A numeric (or logical) MATLAB array.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    dims: Vec<usize>,
    real: NumericData,
    imag: Option<NumericData>,
    logical: bool,
}

impl NumericArray {
    /// Create a real array, validating that `dims` matches the element count.
    pub fn new(dims: Vec<usize>, real: NumericData) -> Result<Self> {
        let expected = element_count(&dims)?;
        if expected != real.len() {
            return Err(Error::invalid_format(format!(
                "array of dimensions {} holds {} elements, expected {}",
                format_dims(&dims),
                real.len(),
                expected
            )));
        }
        Ok(NumericArray {
            dims,
            real,
            imag: None,
            logical: false,
        })
    }

    /// Attach an imaginary part.
    pub fn with_imag(mut self, imag: NumericData) -> Result<Self> {
        if imag.len() != self.real.len() {
            return Err(Error::invalid_format(format!(
                "imaginary part holds {} elements, real part {}",
                imag.len(),
                self.real.len()
            )));
        }
        self.imag = Some(imag);
        Ok(self)
    }

    /// Mark the array as `logical`.
    pub fn logical(mut self, logical: bool) -> Self {
        self.logical = logical;
        self
    }

    /// Stored dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// MATLAB class.
    pub fn class(&self) -> MatClass {
        self.real.class()
    }

    /// Check if the element type is floating-point.
    pub fn is_float(&self) -> bool {
        self.class().is_float()
    }

    /// Check if the array is `logical`.
    pub fn is_logical(&self) -> bool {
        self.logical
    }

    /// Check if the data is complex.
    pub fn is_complex(&self) -> bool {
        self.imag.is_some()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// Check if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    /// Raw real data, column-major.
    pub fn real(&self) -> &NumericData {
        &self.real
    }

    /// Raw imaginary data, column-major (if complex).
    pub fn imag(&self) -> Option<&NumericData> {
        self.imag.as_ref()
    }

    /// Real part as an n-dimensional array indexed like MATLAB.
    ///
    /// Element `[i, j, k]` is MATLAB's `A(i+1, j+1, k+1)`.
    pub fn to_array(&self) -> Result<ArrayD<f64>> {
        ArrayD::from_shape_vec(IxDyn(&self.dims).f(), self.real.to_f64_vec())
            .map_err(|e| Error::invalid_format(format!("Shape error: {}", e)))
    }
}

/// A MATLAB character array.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub(crate) dims: Vec<usize>,
    /// Characters in column-major order.
    pub(crate) chars: Vec<char>,
}

impl CharArray {
    /// Create a character array.
    pub fn new(dims: Vec<usize>, chars: Vec<char>) -> Self {
        CharArray { dims, chars }
    }

    /// Rows of the array joined by newlines.
    pub fn text(&self) -> String {
        let rows = self.dims.first().copied().unwrap_or(0);
        if rows <= 1 {
            return self.chars.iter().collect();
        }
        let cols = self.chars.len() / rows;
        (0..rows)
            .map(|r| (0..cols).map(|c| self.chars[r + c * rows]).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A MATLAB cell array.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    dims: Vec<usize>,
    /// Elements in column-major order.
    elements: Vec<MatValue>,
}

impl CellArray {
    /// Create a cell array, validating that `dims` matches the element count.
    pub fn new(dims: Vec<usize>, elements: Vec<MatValue>) -> Result<Self> {
        let expected = element_count(&dims)?;
        if expected != elements.len() {
            return Err(Error::invalid_format(format!(
                "cell of dimensions {} holds {} elements, expected {}",
                format_dims(&dims),
                elements.len(),
                expected
            )));
        }
        Ok(CellArray { dims, elements })
    }

    /// Stored dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in MATLAB's linear (column-major) order.
    pub fn elements(&self) -> &[MatValue] {
        &self.elements
    }

    /// Elements in row-major order, the order a C-order flatten visits them.
    pub fn row_major(&self) -> Vec<&MatValue> {
        row_major_order(&self.dims)
            .into_iter()
            .map(|i| &self.elements[i])
            .collect()
    }
}

/// A MATLAB struct array.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    dims: Vec<usize>,
    field_names: Vec<String>,
    /// Field values, element-major: element `e`, field `f` at `e * nfields + f`.
    values: Vec<MatValue>,
}

impl StructArray {
    /// Create a struct array.
    pub fn new(dims: Vec<usize>, field_names: Vec<String>, values: Vec<MatValue>) -> Result<Self> {
        let expected = element_count(&dims)?
            .checked_mul(field_names.len())
            .ok_or_else(|| Error::invalid_format("struct field count overflows"))?;
        if expected != values.len() {
            return Err(Error::invalid_format(format!(
                "struct of dimensions {} with {} fields holds {} values",
                format_dims(&dims),
                field_names.len(),
                values.len()
            )));
        }
        Ok(StructArray {
            dims,
            field_names,
            values,
        })
    }

    /// Stored dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of struct elements.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Check if the struct array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get one element by its MATLAB linear index.
    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        if index >= self.len() {
            return None;
        }
        let n = self.field_names.len();
        Some(Record {
            field_names: &self.field_names,
            values: &self.values[index * n..(index + 1) * n],
        })
    }

    /// Elements in row-major order.
    pub fn records(&self) -> Vec<Record<'_>> {
        row_major_order(&self.dims)
            .into_iter()
            .filter_map(|i| self.record(i))
            .collect()
    }
}

/// One element of a struct array, indexable by field name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    field_names: &'a [String],
    values: &'a [MatValue],
}

impl<'a> Record<'a> {
    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&'a MatValue> {
        let values = self.values;
        self.field_names
            .iter()
            .position(|f| f == name)
            .map(|i| &values[i])
    }

    /// Iterate over `(field, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a MatValue)> + 'a {
        let (names, values) = (self.field_names, self.values);
        names
            .iter()
            .zip(values.iter())
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Column-major linear indices visited in row-major order.
fn row_major_order(dims: &[usize]) -> Vec<usize> {
    let count: usize = dims.iter().product();
    match ArrayD::from_shape_vec(IxDyn(dims).f(), (0..count).collect::<Vec<_>>()) {
        Ok(indices) => indices.iter().copied().collect(),
        Err(_) => (0..count).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: f64) -> MatValue {
        MatValue::Numeric(NumericArray::new(vec![1, 1], NumericData::Double(vec![v])).unwrap())
    }

    #[test]
    fn test_numeric_dims_mismatch() {
        let result = NumericArray::new(vec![2, 2], NumericData::UInt8(vec![1, 2, 3]));
        assert!(result.is_err());
    }

    #[test]
    fn test_element_count_overflow() {
        let huge = i32::MAX as usize;
        assert_eq!(element_count(&[2, 3, 4]).unwrap(), 24);
        assert_eq!(element_count(&[]).unwrap(), 1);
        assert!(matches!(
            element_count(&[huge, huge, huge]),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(NumericArray::new(vec![huge, huge, huge], NumericData::UInt8(vec![0])).is_err());
        assert!(CellArray::new(vec![huge, huge, huge], Vec::new()).is_err());
    }

    #[test]
    fn test_to_array_is_matlab_indexed() {
        // MATLAB [1 2 3; 4 5 6] is stored column-major as 1 4 2 5 3 6
        let a = NumericArray::new(
            vec![2, 3],
            NumericData::Double(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]),
        )
        .unwrap();
        let arr = a.to_array().unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr[[0, 2]], 3.0);
        assert_eq!(arr[[1, 0]], 4.0);
    }

    #[test]
    fn test_cell_row_major_order() {
        // 2x2 cell {1 2; 3 4}, stored column-major as 1 3 2 4
        let cell = CellArray::new(
            vec![2, 2],
            vec![scalar(1.0), scalar(3.0), scalar(2.0), scalar(4.0)],
        )
        .unwrap();
        let order: Vec<_> = cell
            .row_major()
            .into_iter()
            .map(|v| match v {
                MatValue::Numeric(a) => a.to_array().unwrap()[[0, 0]],
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_struct_record_lookup() {
        let s = StructArray::new(
            vec![1, 2],
            vec!["a".to_string(), "b".to_string()],
            vec![scalar(1.0), scalar(2.0), scalar(3.0), scalar(4.0)],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
        let second = s.record(1).unwrap();
        assert_eq!(second.get("a"), Some(&scalar(3.0)));
        assert!(second.get("missing").is_none());
        assert!(s.record(2).is_none());
    }

    #[test]
    fn test_char_text() {
        let c = CharArray::new(vec![1, 2], vec!['h', 'i']);
        assert_eq!(c.text(), "hi");

        // ['ab'; 'cd'] stored column-major as a c b d
        let c = CharArray::new(vec![2, 2], vec!['a', 'c', 'b', 'd']);
        assert_eq!(c.text(), "ab\ncd");
    }

    #[test]
    fn test_type_name() {
        let cell = CellArray::new(vec![1, 5], vec![scalar(0.0); 5]).unwrap();
        assert_eq!(MatValue::Cell(cell).type_name(), "1x5 cell");

        let mask = NumericArray::new(vec![2, 1], NumericData::UInt8(vec![0, 1]))
            .unwrap()
            .logical(true);
        assert_eq!(MatValue::Numeric(mask).type_name(), "2x1 logical");
    }
}
