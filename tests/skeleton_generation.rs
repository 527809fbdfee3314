//! Integration tests for generating the bundled algorithm skeleton

use pretty_assertions::assert_eq;
use slotgen::{
    check_conformance, generate, generate_with_config, GenerateConfig, GenerationRequest,
    InjectBlock,
};

fn source_for(request: &GenerationRequest) -> String {
    let files = generate(request).expect("Should generate");
    let name = request.name.as_deref().unwrap_or("query");
    files
        .contents(&format!("{}.cxx", name))
        .expect("Should have a source file")
        .to_string()
}

fn header_for(request: &GenerationRequest) -> String {
    let files = generate(request).expect("Should generate");
    let name = request.name.as_deref().unwrap_or("query");
    files
        .contents(&format!("{}.h", name))
        .expect("Should have a header file")
        .to_string()
}

/// Text between the opening brace after `signature` and its closing brace
fn body<'a>(source: &'a str, signature: &str) -> &'a str {
    let at = source
        .find(signature)
        .unwrap_or_else(|| panic!("no '{}' in:\n{}", signature, source));
    let rest = &source[at..];
    let open = rest.find("{\n").expect("Should open a body") + 2;
    let close = rest[open..].find("\n}").expect("Should close the body");
    &rest[open..open + close]
}

#[test]
fn test_default_request_conforms() {
    let source = source_for(&GenerationRequest::new());
    assert_eq!(check_conformance(&source, "query"), Ok(()));
}

#[test]
fn test_generation_is_deterministic() {
    let request = GenerationRequest::from_toml(
        r#"
name = "jets"
body_include_files = ["xAODJet/JetContainer.h"]
book_code = ["m_tree = new TTree(\"jets\", \"jets\");"]
query_code = ["m_count++;", "m_tree->Fill();"]
private_members = ["TTree* m_tree;"]
"#,
    )
    .unwrap();
    assert_eq!(generate(&request).unwrap(), generate(&request).unwrap());
}

#[test]
fn test_empty_slots_leave_no_dangling_text() {
    let source = source_for(&GenerationRequest::new());

    assert!(source.contains(
        "#include \"xAODRootAccess/tools/TFileAccessTracer.h\"\n\n#include <TTree.h>"
    ));
    assert!(!source.contains("#include \"\""));
    assert!(source.contains("    : EL::AnaAlgorithm (name, pSvcLocator)\n{"));
    assert!(!source.contains("pSvcLocator),"));
    assert_eq!(
        body(&source, "StatusCode query :: execute ()"),
        "  return StatusCode::SUCCESS;"
    );
    assert_eq!(
        body(&source, "StatusCode query :: initialize ()"),
        "  return StatusCode::SUCCESS;"
    );
}

#[test]
fn test_member_initializers_follow_base_initializer() {
    let request = GenerationRequest {
        instance_initialization: vec!["m_x(0)".into(), "m_y(1)".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert!(source.contains("(name, pSvcLocator), m_x(0), m_y(1)\n{"));
    assert_eq!(check_conformance(&source, "query"), Ok(()));
}

#[test]
fn test_query_code_is_the_execute_body() {
    let request = GenerationRequest {
        query_code: vec!["counter++;".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert_eq!(
        body(&source, "StatusCode query :: execute ()"),
        "  counter++;\n  return StatusCode::SUCCESS;"
    );
}

#[test]
fn test_book_code_precedes_initialize_lines() {
    let request = GenerationRequest {
        book_code: vec!["book();".into()],
        initialize_lines: vec!["setup();".into(), "more();".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert_eq!(
        body(&source, "StatusCode query :: initialize ()"),
        "  book();\n  setup();\n  more();\n  return StatusCode::SUCCESS;"
    );
}

#[test]
fn test_fragments_keep_caller_order() {
    let request = GenerationRequest {
        body_include_files: vec!["c.h".into(), "a.h".into(), "b.h".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert!(source.contains(
        "TFileAccessTracer.h\"\n#include \"c.h\"\n#include \"a.h\"\n#include \"b.h\"\n\n#include <TTree.h>"
    ));
}

#[test]
fn test_ctor_lines_follow_telemetry_switch() {
    let request = GenerationRequest {
        ctor_lines: vec!["declareProperty(\"cut\", m_cut);".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert!(source.contains(
        "enableDataSubmission(false);\n  declareProperty(\"cut\", m_cut);\n}"
    ));
}

#[test]
fn test_telemetry_switch_from_config() {
    let config = GenerateConfig::new().with_file_access_telemetry(true);
    let files = generate_with_config(&GenerationRequest::new(), config).unwrap();
    let source = files.contents("query.cxx").unwrap();
    assert!(source.contains("xAOD::TFileAccessTracer::enableDataSubmission(true);"));
}

#[test]
fn test_header_declares_class_and_members() {
    let request = GenerationRequest {
        name: Some("jets".to_string()),
        header_include_files: vec!["TTree.h".into()],
        private_members: vec!["TTree* m_tree;".into(), "int m_count = 0;".into()],
        ..Default::default()
    };
    let header = header_for(&request);
    assert!(header.starts_with("#ifndef analysis_jets_H\n#define analysis_jets_H\n"));
    assert!(header.contains("#include <AnaAlgorithm/AnaAlgorithm.h>\n#include \"TTree.h\"\n\n"));
    assert!(header.contains("class jets : public EL::AnaAlgorithm"));
    assert!(header.contains("private:\n  TTree* m_tree;\n  int m_count = 0;\n};"));
    assert!(header.trim_end().ends_with("#endif"));
}

#[test]
fn test_empty_header_has_no_member_lines() {
    let header = header_for(&GenerationRequest::new());
    assert!(header.contains("#include <AnaAlgorithm/AnaAlgorithm.h>\n\nclass query"));
    assert!(header.contains("private:\n};"));
}

#[test]
fn test_inject_blocks_reach_both_files() {
    let request = GenerationRequest {
        body_include_files: vec!["own.h".into()],
        ..Default::default()
    }
    .with_inject(InjectBlock {
        name: Some("jet_tool".to_string()),
        body_includes: vec!["JetTool.h".into()],
        header_includes: vec!["AsgTools/AnaToolHandle.h".into()],
        private_members: vec!["asg::AnaToolHandle<IJetTool> m_tool;".into()],
        instance_initialization: vec!["m_tool(\"JetTool\", this)".into()],
        ctor_lines: vec!["declareProperty(\"tool\", m_tool);".into()],
        initialize_lines: vec!["ANA_CHECK(m_tool.initialize());".into()],
    });

    let source = source_for(&request);
    let header = header_for(&request);

    assert!(source.contains("#include \"own.h\"\n#include \"JetTool.h\"\n"));
    assert!(source.contains("(name, pSvcLocator), m_tool(\"JetTool\", this)\n{"));
    assert!(source.contains("  declareProperty(\"tool\", m_tool);\n}"));
    assert_eq!(
        body(&source, "StatusCode query :: initialize ()"),
        "  ANA_CHECK(m_tool.initialize());\n  return StatusCode::SUCCESS;"
    );
    assert!(header.contains("#include \"AsgTools/AnaToolHandle.h\"\n"));
    assert!(header.contains("  asg::AnaToolHandle<IJetTool> m_tool;\n};"));
}

#[test]
fn test_fragments_are_not_escaped() {
    let request = GenerationRequest {
        query_code: vec!["if (a < b && c > d) { x = \"{{ y }}\"; }".into()],
        ..Default::default()
    };
    let source = source_for(&request);
    assert!(source.contains("  if (a < b && c > d) { x = \"{{ y }}\"; }\n"));
}
