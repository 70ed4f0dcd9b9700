//! MAT file loading and variable lookup.
//!
//! This module provides [`MatFile`], the decoded variable table of one
//! Level 5 `.mat` file.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use super::data::{format_dims, MatValue};
use super::reader::{self, MatHeader};

/// Prefix of metadata keys, which are never reported as variables.
pub const METADATA_PREFIX: &str = "__";

/// A loaded MAT file.
///
/// Variables are kept in file order with their full nested structure.
///
/// # Supported Formats
///
/// - Level 5 MAT files (MATLAB v5, v6, v7), either byte order
/// - v7 compressed variables (zlib)
/// - Numeric, logical, char, cell and struct arrays
///
/// # Unsupported
///
/// - Level 4 MAT files (legacy format)
/// - HDF5-based v7.3 files
/// - Sparse matrices, objects and function handles are listed but not decoded
///
/// # Example
///
/// ```no_run
/// use matimg_rs::MatFile;
///
/// let mat = MatFile::open("Chip_1.mat")?;
///
/// for name in mat.variable_names() {
///     println!("Variable: {}", name);
/// }
///
/// if let Some((name, value)) = mat.find_case_insensitive("icolor") {
///     println!("{} is a {}", name, value.type_name());
/// }
/// # Ok::<(), matimg_rs::Error>(())
/// ```
#[derive(Debug)]
pub struct MatFile {
    /// Decoded variables in file order.
    variables: Vec<(String, MatValue)>,

    /// Names of variables flagged as global.
    globals: Vec<String>,

    /// Decoded file header.
    header: MatHeader,

    /// Source file path (for error messages).
    path: String,
}

impl MatFile {
    /// Open and parse a MAT file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::InvalidFormat`] if the file is not a valid MAT file
    /// - [`Error::UnsupportedFormat`] for v7.3 and Level 4 files
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let bytes = fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open MAT file '{}': {}", path_str, e),
            ))
        })?;

        Self::from_bytes(&bytes, path_str)
    }

    /// Parse a MAT file already held in memory.
    ///
    /// `path` is only used to label error messages and listings.
    pub fn from_bytes(bytes: &[u8], path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let (header, parsed) = reader::parse(bytes).map_err(|e| match e {
            Error::InvalidFormat { reason } => {
                Error::invalid_format(format!("'{}': {}", path, reason))
            }
            other => other,
        })?;

        let mut variables = Vec::with_capacity(parsed.len());
        let mut globals = Vec::new();
        for var in parsed {
            debug!("Decoded '{}' ({}) from {}", var.name, var.value.type_name(), path);
            if var.global {
                globals.push(var.name.clone());
            }
            variables.push((var.name, var.value));
        }

        Ok(MatFile {
            variables,
            globals,
            header,
            path,
        })
    }

    /// Names of all variables, in file order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(name, _)| name.as_str())
    }

    /// All keys of the container: metadata keys followed by variable names.
    ///
    /// Metadata keys start with [`METADATA_PREFIX`].
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec!["__header__", "__version__", "__globals__"];
        keys.extend(self.variable_names());
        keys
    }

    /// Keys that are real data, i.e. everything without the metadata prefix.
    pub fn data_keys(&self) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| !k.starts_with(METADATA_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Get a variable by its exact name.
    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Find a variable ignoring ASCII case; the first match in file order wins.
    ///
    /// Returns the stored name together with the value.
    pub fn find_case_insensitive(&self, name: &str) -> Option<(&str, &MatValue)> {
        self.variables
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, v)| (n.as_str(), v))
    }

    /// Like [`find_case_insensitive`](Self::find_case_insensitive), but fails
    /// with the list of available variables when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableNotFound`] if no variable matches.
    pub fn require_case_insensitive(&self, name: &str) -> Result<(&str, &MatValue)> {
        self.find_case_insensitive(name)
            .ok_or_else(|| Error::VariableNotFound {
                name: name.to_string(),
                available: self.data_keys(),
            })
    }

    /// Number of variables in the file.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Check if the file contains no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the decoded header.
    pub fn header(&self) -> &MatHeader {
        &self.header
    }

    /// Names of variables saved as global.
    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    /// Iterate over all variables in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatValue)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get detailed information about all variables (for --list mode).
    ///
    /// Returns a formatted table of name, size and class.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Variables in '{}':", self.path));
        lines.push(String::new());

        let max_name_len = self
            .variable_names()
            .map(|n| n.len())
            .max()
            .unwrap_or(4)
            .max(4);

        lines.push(format!(
            "  {:<width$}  {:>14}  {:>10}",
            "Name",
            "Size",
            "Class",
            width = max_name_len
        ));
        lines.push(format!(
            "  {:-<width$}  {:->14}  {:->10}",
            "", "", "",
            width = max_name_len
        ));

        for (name, value) in self.iter() {
            lines.push(format!(
                "  {:<width$}  {:>14}  {:>10}",
                name,
                format_dims(value.dims()),
                value.class().name(),
                width = max_name_len
            ));
        }

        lines.join("\n")
    }
}

impl IntoIterator for MatFile {
    type Item = (String, MatValue);
    type IntoIter = std::vec::IntoIter<(String, MatValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MatBuilder, TestValue};

    #[test]
    fn test_open_nonexistent() {
        let result = MatFile::open("/nonexistent/file.mat");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let bytes = MatBuilder::new()
            .var("other_var", TestValue::double(&[1, 1], &[1.0]))
            .var("ICOLOR", TestValue::double(&[1, 1], &[2.0]))
            .to_bytes();
        let mat = MatFile::from_bytes(&bytes, "test.mat").unwrap();

        assert!(mat.get("Icolor").is_none());
        let (name, _) = mat.find_case_insensitive("Icolor").unwrap();
        assert_eq!(name, "ICOLOR");
    }

    #[test]
    fn test_not_found_lists_data_keys_only() {
        let bytes = MatBuilder::new()
            .var("other_var", TestValue::double(&[1, 1], &[1.0]))
            .to_bytes();
        let mat = MatFile::from_bytes(&bytes, "test.mat").unwrap();

        assert!(mat.keys().contains(&"__header__"));
        match mat.require_case_insensitive("Icolor") {
            Err(Error::VariableNotFound { available, .. }) => {
                assert_eq!(available, vec!["other_var".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_describe_lists_variables() {
        let bytes = MatBuilder::new()
            .var("Icolor", TestValue::cell(&[1, 2], vec![
                TestValue::uint8(&[2, 2], &[0, 1, 2, 3]),
                TestValue::uint8(&[2, 2], &[4, 5, 6, 7]),
            ]))
            .to_bytes();
        let mat = MatFile::from_bytes(&bytes, "chip.mat").unwrap();
        let text = mat.describe();
        assert!(text.contains("Variables in 'chip.mat'"));
        assert!(text.contains("Icolor"));
        assert!(text.contains("1x2"));
        assert!(text.contains("cell"));
    }
}
