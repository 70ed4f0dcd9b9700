//! End-to-end extraction tests: MAT fixtures in, JPEG files out.

use std::fs;
use std::path::{Path, PathBuf};

use matimg_rs::testing::{MatBuilder, TestValue};
use matimg_rs::{Error, ExtractConfig, Extractor, Result};
use ndarray::{ArrayD, IxDyn};
use tempfile::TempDir;

/// Workspace with an input and an output directory.
struct Workspace {
    _temp: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let input = temp.path().join("imagens_mat");
        let output = temp.path().join("imagens_jpg");
        fs::create_dir(&input).unwrap();
        Workspace {
            _temp: temp,
            input,
            output,
        }
    }

    fn add(&self, name: &str, builder: MatBuilder) -> PathBuf {
        let path = self.input.join(name);
        builder.write(&path).unwrap();
        path
    }

    fn extractor(&self) -> Extractor {
        Extractor::new(ExtractConfig::new(&self.input, &self.output)).unwrap()
    }

    fn output_names(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(&self.output)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// A file holding one top-level miMATRIX with the given class and dims,
/// followed by `tail` (already encoded elements).
fn raw_matrix_file(class: u32, dims: &[i32], tail: &[u8]) -> Vec<u8> {
    fn element(data_type: u32, data: &[u8]) -> Vec<u8> {
        let mut out = data_type.to_le_bytes().to_vec();
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    let mut flags = class.to_le_bytes().to_vec();
    flags.extend_from_slice(&[0; 4]);
    let dims: Vec<u8> = dims.iter().flat_map(|d| d.to_le_bytes()).collect();

    let mut body = element(6, &flags);
    body.extend(element(5, &dims));
    body.extend(element(1, b"Icolor"));
    body.extend_from_slice(tail);

    let mut bytes = MatBuilder::new().to_bytes();
    bytes.extend(element(14, &body));
    bytes
}

fn jpeg_dims(path: &Path) -> (u32, u32) {
    let img = image::open(path).expect("output should decode");
    (img.width(), img.height())
}

#[test]
fn test_five_frames_written_per_chip() -> Result<()> {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_12.mat",
        MatBuilder::new().var("Icolor", TestValue::rgb_frames(5, 40, 48)),
    );

    let written = ws.extractor().extract_file(&path)?;
    assert_eq!(written.len(), 5);
    assert_eq!(
        ws.output_names(),
        vec![
            "imagem_12_1.jpg",
            "imagem_12_2.jpg",
            "imagem_12_3.jpg",
            "imagem_12_4.jpg",
            "imagem_12_5.jpg",
        ]
    );
    assert_eq!(jpeg_dims(&written[0]), (48, 40));
    Ok(())
}

#[test]
fn test_only_first_five_frames_used() -> Result<()> {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_3.mat",
        MatBuilder::new()
            .compressed(true)
            .var("Icolor", TestValue::rgb_frames(8, 10, 10)),
    );

    let written = ws.extractor().extract_file(&path)?;
    assert_eq!(written.len(), 5);
    assert!(!ws.output.join("imagem_3_6.jpg").exists());
    Ok(())
}

#[test]
fn test_missing_variable_lists_available() {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_1.mat",
        MatBuilder::new().var("other_var", TestValue::double(&[1, 1], &[1.0])),
    );

    let err = ws.extractor().extract_file(&path).unwrap_err();
    assert!(matches!(err, Error::VariableNotFound { .. }));
    assert!(err.to_string().contains("other_var"));
    assert!(!err.to_string().contains("__header__"));
}

#[test]
fn test_too_few_frames_reports_count() {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_1.mat",
        MatBuilder::new().var("Icolor", TestValue::rgb_frames(3, 8, 8)),
    );

    let err = ws.extractor().extract_file(&path).unwrap_err();
    match err {
        Error::NotEnoughFrames { found, .. } => assert_eq!(found, 3),
        other => panic!("unexpected error: {}", other),
    }
    assert!(ws.output_names().is_empty());
}

#[test]
fn test_uppercase_variable_name_resolves() -> Result<()> {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_5.mat",
        MatBuilder::new().var("ICOLOR", TestValue::rgb_frames(5, 8, 8)),
    );

    assert_eq!(ws.extractor().extract_file(&path)?.len(), 5);
    Ok(())
}

#[test]
fn test_non_matching_filename_uses_stem() -> Result<()> {
    let ws = Workspace::new();
    let path = ws.add(
        "session_a.mat",
        MatBuilder::new().var("Icolor", TestValue::rgb_frames(5, 8, 8)),
    );

    ws.extractor().extract_file(&path)?;
    assert!(ws.output.join("imagem_session_a_1.jpg").exists());
    assert!(ws.output.join("imagem_session_a_5.jpg").exists());
    Ok(())
}

#[test]
fn test_float_and_channel_first_frames() -> Result<()> {
    let ws = Workspace::new();

    // Normalized grayscale doubles, then a 3x64x64 channel-first image
    let gray = ArrayD::from_shape_fn(IxDyn(&[24, 16]), |ix| ix[0] as f64 / 23.0);
    let planar = ArrayD::from_shape_fn(IxDyn(&[3, 64, 64]), |ix| (ix[0] * 80) as u8);
    let frames = vec![
        TestValue::double_array(&gray),
        TestValue::uint8_array(&planar),
        TestValue::double_array(&gray),
        TestValue::double_array(&gray),
        TestValue::double_array(&gray),
    ];
    let path = ws.add(
        "Chip_9.mat",
        MatBuilder::new().var("Icolor", TestValue::cell(&[5, 1], frames)),
    );

    let extractor = ws.extractor();
    let plan = extractor.plan_file(&path)?;
    assert_eq!(plan.frames[0].output_shape, vec![24, 16]);
    assert_eq!(plan.frames[1].source_shape, vec![3, 64, 64]);
    assert_eq!(plan.frames[1].output_shape, vec![64, 64, 3]);

    let written = extractor.extract_file(&path)?;
    assert_eq!(jpeg_dims(&written[0]), (16, 24));
    assert_eq!(jpeg_dims(&written[1]), (64, 64));
    Ok(())
}

#[test]
fn test_failure_mid_file_keeps_earlier_frames() {
    let ws = Workspace::new();
    let rgba = TestValue::uint8(&[8, 8, 4], &[0; 256]);
    let ok = TestValue::uint8(&[8, 8, 3], &[0; 192]);
    let path = ws.add(
        "Chip_4.mat",
        MatBuilder::new().var(
            "Icolor",
            TestValue::cell(&[1, 5], vec![ok.clone(), ok.clone(), rgba, ok.clone(), ok]),
        ),
    );

    let err = ws.extractor().extract_file(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFrameShape { .. }));
    assert_eq!(ws.output_names(), vec!["imagem_4_1.jpg", "imagem_4_2.jpg"]);
}

#[test]
fn test_plan_writes_nothing() -> Result<()> {
    let ws = Workspace::new();
    let path = ws.add(
        "Chip_2.mat",
        MatBuilder::new().var("Icolor", TestValue::rgb_frames(6, 8, 8)),
    );

    let plan = ws.extractor().plan_file(&path)?;
    assert_eq!(plan.chip_id, "2");
    assert_eq!(plan.variable, "Icolor");
    assert_eq!(plan.collection, "cell array");
    assert_eq!(plan.available, 6);
    assert_eq!(plan.frames.len(), 5);
    assert!(!ws.output.exists());
    Ok(())
}

#[test]
fn test_batch_continues_after_failures() -> Result<()> {
    let ws = Workspace::new();
    ws.add("Chip_1.mat", MatBuilder::new().var("Icolor", TestValue::rgb_frames(5, 8, 8)));
    ws.add("Chip_2.mat", MatBuilder::new().var("other_var", TestValue::char("x")));
    ws.add("Chip_3.mat", MatBuilder::new().var("Icolor", TestValue::rgb_frames(2, 8, 8)));
    ws.add("Chip_4.mat", MatBuilder::new().compressed(true).var("Icolor", TestValue::rgb_frames(5, 8, 8)));
    fs::write(ws.input.join("Chip_5.mat"), b"not a mat file")?;

    let mut seen = Vec::new();
    let report = ws
        .extractor()
        .run(|outcome| seen.push((outcome.file_name(), outcome.is_ok())))?;

    assert_eq!(
        seen,
        vec![
            ("Chip_1.mat".to_string(), true),
            ("Chip_2.mat".to_string(), false),
            ("Chip_3.mat".to_string(), false),
            ("Chip_4.mat".to_string(), true),
            ("Chip_5.mat".to_string(), false),
        ]
    );
    assert_eq!(report.images, 10);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 3);
    assert_eq!(report.output_dir, ws.output);
    assert_eq!(ws.output_names().len(), 10);
    Ok(())
}

#[test]
fn test_batch_without_inputs_fails() {
    let ws = Workspace::new();
    ws.add("notes.mat", MatBuilder::new());

    let mut calls = 0;
    let err = ws.extractor().run(|_| calls += 1).unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
    assert!(err.to_string().contains("imagens_mat"));
    assert_eq!(calls, 0);
}

#[test]
fn test_oversized_dimensions_fail_per_file() -> Result<()> {
    let ws = Workspace::new();
    let huge = i32::MAX;

    // Cell claiming i32::MAX x i32::MAX elements with none present
    fs::write(ws.input.join("Chip_1.mat"), raw_matrix_file(1, &[huge, huge], &[]))?;
    ws.add("Chip_2.mat", MatBuilder::new().var("Icolor", TestValue::rgb_frames(5, 8, 8)));
    // Double array whose element count overflows usize, with one value stored
    let mut one_double = vec![9, 0, 0, 0, 8, 0, 0, 0];
    one_double.extend_from_slice(&1.0f64.to_le_bytes());
    fs::write(
        ws.input.join("Chip_3.mat"),
        raw_matrix_file(6, &[huge, huge, huge], &one_double),
    )?;
    // Struct with one field whose value count overflows usize
    let mut field = vec![5, 0, 4, 0, 32, 0, 0, 0, 1, 0, 0, 0, 32, 0, 0, 0];
    field.extend_from_slice(b"img");
    field.resize(16 + 32, 0);
    fs::write(
        ws.input.join("Chip_4.mat"),
        raw_matrix_file(2, &[huge, huge, huge], &field),
    )?;

    let report = ws.extractor().run(|_| {})?;

    let results: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| (o.file_name(), o.is_ok()))
        .collect();
    assert_eq!(
        results,
        vec![
            ("Chip_1.mat".to_string(), false),
            ("Chip_2.mat".to_string(), true),
            ("Chip_3.mat".to_string(), false),
            ("Chip_4.mat".to_string(), false),
        ]
    );
    for index in [0, 2, 3] {
        assert!(matches!(
            report.outcomes[index].result,
            Err(Error::InvalidFormat { .. })
        ));
    }
    assert_eq!(report.images, 5);
    Ok(())
}
