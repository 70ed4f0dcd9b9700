//! Integration tests for Level 5 MAT decoding.

use approx::assert_relative_eq;
use matimg_rs::mat::{MatValue, NumericData};
use matimg_rs::testing::{MatBuilder, TestValue};
use matimg_rs::{Error, MatClass, MatFile, Result};
use tempfile::TempDir;

/// A little of everything a real export might contain.
fn mixed_fixture() -> MatBuilder {
    MatBuilder::new()
        .var("label", TestValue::char("chip session"))
        .var("mask", TestValue::logical(&[2, 2], &[true, false, false, true]))
        .var("scale", TestValue::single(&[1, 2], &[0.25, 4.5]))
        .var("compact", TestValue::double_compact(&[1, 3], &[1, 2, 250]))
        .var(
            "meta",
            TestValue::structure(
                &[1, 1],
                &["exposure", "camera"],
                vec![TestValue::double(&[1, 1], &[12.5]), TestValue::char("cam0")],
            ),
        )
        .var(
            "Icolor",
            TestValue::cell(
                &[1, 2],
                vec![
                    TestValue::uint8(&[2, 2, 3], &[0; 12]),
                    TestValue::uint16(&[2, 2], &[1, 2, 3, 4]),
                ],
            ),
        )
}

fn check_mixed(mat: &MatFile) {
    let names: Vec<_> = mat.variable_names().collect();
    assert_eq!(names, vec!["label", "mask", "scale", "compact", "meta", "Icolor"]);

    match mat.get("label") {
        Some(MatValue::Char(c)) => assert_eq!(c.text(), "chip session"),
        other => panic!("label: {:?}", other),
    }

    match mat.get("mask") {
        Some(MatValue::Numeric(a)) => {
            assert!(a.is_logical());
            assert_eq!(a.real(), &NumericData::UInt8(vec![1, 0, 0, 1]));
        }
        other => panic!("mask: {:?}", other),
    }

    match mat.get("scale") {
        Some(MatValue::Numeric(a)) => {
            assert_eq!(a.class(), MatClass::Single);
            let arr = a.to_array().unwrap();
            assert_relative_eq!(arr[[0, 1]], 4.5);
        }
        other => panic!("scale: {:?}", other),
    }

    // Stored as miUINT8, decoded into the double class
    match mat.get("compact") {
        Some(MatValue::Numeric(a)) => {
            assert_eq!(a.class(), MatClass::Double);
            assert_eq!(a.real(), &NumericData::Double(vec![1.0, 2.0, 250.0]));
        }
        other => panic!("compact: {:?}", other),
    }

    match mat.get("meta") {
        Some(MatValue::Struct(s)) => {
            let record = s.record(0).unwrap();
            match record.get("camera") {
                Some(MatValue::Char(c)) => assert_eq!(c.text(), "cam0"),
                other => panic!("camera: {:?}", other),
            }
            assert!(record.get("exposure").is_some());
        }
        other => panic!("meta: {:?}", other),
    }

    match mat.get("Icolor") {
        Some(MatValue::Cell(cell)) => {
            assert_eq!(cell.dims(), &[1, 2]);
            assert_eq!(cell.elements()[0].dims(), &[2, 2, 3]);
            assert_eq!(cell.elements()[1].class(), MatClass::UInt16);
        }
        other => panic!("Icolor: {:?}", other),
    }
}

#[test]
fn test_decode_uncompressed() -> Result<()> {
    let mat = MatFile::from_bytes(&mixed_fixture().to_bytes(), "mixed.mat")?;
    check_mixed(&mat);
    assert!(mat.header().text.starts_with("MATLAB 5.0 MAT-file"));
    Ok(())
}

#[test]
fn test_decode_compressed() -> Result<()> {
    let mat = MatFile::from_bytes(&mixed_fixture().compressed(true).to_bytes(), "mixed.mat")?;
    check_mixed(&mat);
    Ok(())
}

#[test]
fn test_decode_big_endian() -> Result<()> {
    let bytes = mixed_fixture().big_endian(true).to_bytes();
    let mat = MatFile::from_bytes(&bytes, "mixed.mat")?;
    check_mixed(&mat);
    assert_eq!(mat.header().byte_order, matimg_rs::mat::ByteOrder::Big);
    Ok(())
}

#[test]
fn test_open_from_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("Chip_1.mat");
    mixed_fixture().compressed(true).write(&path)?;

    let mat = MatFile::open(&path)?;
    assert_eq!(mat.len(), 6);
    assert!(mat.path().ends_with("Chip_1.mat"));
    Ok(())
}

#[test]
fn test_globals_are_metadata() -> Result<()> {
    let bytes = MatBuilder::new()
        .global_var("g", TestValue::double(&[1, 1], &[1.0]))
        .var("x", TestValue::double(&[1, 1], &[2.0]))
        .to_bytes();
    let mat = MatFile::from_bytes(&bytes, "globals.mat")?;

    assert_eq!(mat.globals(), &["g".to_string()]);
    assert_eq!(mat.data_keys(), vec!["g".to_string(), "x".to_string()]);
    assert!(mat.keys().iter().any(|k| *k == "__globals__"));
    Ok(())
}

#[test]
fn test_truncated_file_is_invalid() {
    let mut bytes = mixed_fixture().to_bytes();
    bytes.truncate(bytes.len() - 20);
    match MatFile::from_bytes(&bytes, "cut.mat") {
        Err(Error::InvalidFormat { reason }) => assert!(reason.contains("cut.mat")),
        other => panic!("unexpected result: {:?}", other.map(|m| m.len())),
    }
}

#[test]
fn test_garbage_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.mat");
    std::fs::write(&path, "dummy").unwrap();
    assert!(MatFile::open(&path).is_err());
}
