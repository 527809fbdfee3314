//! Integration tests for writing generated files to disk

use std::fs;
use std::path::Path;

use slotgen::{
    GenerateConfig, GenerateError, GenerationRequest, Generator, RenderError, Skeleton,
    SlotDecl, SlotRegistry,
};

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn test_writes_source_and_header() {
    let dir = tempfile::tempdir().unwrap();
    let request = GenerationRequest::from_toml(
        r#"
name = "jets"
query_code = ["m_count++;"]
"#,
    )
    .unwrap();

    let generator = Generator::new(GenerateConfig::default()).unwrap();
    let written = generator.generate(&request).unwrap().write_to(dir.path()).unwrap();

    assert_eq!(written, vec![dir.path().join("jets.cxx"), dir.path().join("jets.h")]);
    let source = fs::read_to_string(dir.path().join("jets.cxx")).unwrap();
    assert!(source.contains("  m_count++;\n  return StatusCode::SUCCESS;"));
    assert_eq!(file_count(dir.path()), 2);
}

#[test]
fn test_request_file_round_trip_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let request_path = dir.path().join("request.toml");
    fs::write(
        &request_path,
        "name = \"met\"\nbody_include_files = [\"xAODMissingET/MissingETContainer.h\"]\n",
    )
    .unwrap();

    let out = dir.path().join("out");
    let request = GenerationRequest::from_file(&request_path).unwrap();
    slotgen::generate(&request).unwrap().write_to(&out).unwrap();

    let source = fs::read_to_string(out.join("met.cxx")).unwrap();
    assert!(source.contains("#include \"xAODMissingET/MissingETContainer.h\"\n"));
    assert!(out.join("met.h").exists());
}

#[test]
fn test_failing_file_writes_nothing() {
    // The first file renders, the second needs a slot nobody binds
    let mut registry = SlotRegistry::standard();
    registry.declare(SlotDecl::scalar("banner")).unwrap();
    let mut skeleton = Skeleton::bundled().unwrap();
    skeleton.add_file(".txt", "{{ banner }}\n", false).unwrap();
    let generator =
        Generator::with_skeleton(skeleton, registry, GenerateConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let result = generator
        .generate(&GenerationRequest::new())
        .map(|files| files.write_to(dir.path()));

    match result {
        Err(GenerateError::Render { file, error, .. }) => {
            assert_eq!(file, "query.txt");
            assert!(matches!(error, RenderError::MissingSlot { ref name, .. } if name == "banner"));
        }
        other => panic!("Expected a render error, got {:?}", other),
    }
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn test_bad_template_override_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenerateConfig::new().with_source_template("{{ name }}{% endfor %}");
    let result = Generator::new(config)
        .and_then(|g| g.generate(&GenerationRequest::new()))
        .map(|files| files.write_to(dir.path()));

    assert!(matches!(result, Err(GenerateError::Syntax { .. })));
    assert_eq!(file_count(dir.path()), 0);
}
