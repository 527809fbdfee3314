//! Generation requests: the fragment lists handed over by the query compiler
//!
//! A request is usually read from TOML:
//!
//! ```toml
//! name = "query"
//! body_include_files = ["xAODJet/JetContainer.h"]
//! query_code = ["m_count++;"]
//!
//! [[inject]]
//! name = "tool"
//! ctor_lines = ["declareProperty(\"cut\", m_cut);"]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::context::Context;
use crate::fragment::Fragment;
use crate::slot::{self, SlotRegistry};

/// Errors that can occur when loading a request
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed to read request file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse request TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid algorithm name '{0}': must be a C++ identifier")]
    InvalidName(String),
}

/// A block of fragments for several slots at once
///
/// Blocks are appended to the request's own lists in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectBlock {
    /// Label used in diagnostics only
    pub name: Option<String>,
    pub body_includes: Vec<Fragment>,
    pub header_includes: Vec<Fragment>,
    pub private_members: Vec<Fragment>,
    pub instance_initialization: Vec<Fragment>,
    pub ctor_lines: Vec<Fragment>,
    pub initialize_lines: Vec<Fragment>,
}

/// Everything needed to generate one algorithm
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationRequest {
    /// Class name; the registry default applies when absent
    pub name: Option<String>,
    pub body_include_files: Vec<Fragment>,
    pub instance_initialization: Vec<Fragment>,
    pub ctor_lines: Vec<Fragment>,
    pub book_code: Vec<Fragment>,
    pub initialize_lines: Vec<Fragment>,
    pub query_code: Vec<Fragment>,
    pub header_include_files: Vec<Fragment>,
    pub private_members: Vec<Fragment>,
    pub inject: Vec<InjectBlock>,
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A request's own fragments followed by each block's, in block order
fn merge(
    own: &[Fragment],
    blocks: &[InjectBlock],
    pick: impl Fn(&InjectBlock) -> &[Fragment],
) -> Vec<Fragment> {
    own.iter()
        .chain(blocks.iter().flat_map(|b| pick(b).iter()))
        .cloned()
        .collect()
}

impl GenerationRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a request from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RequestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a request from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, RequestError> {
        let request: GenerationRequest = toml::from_str(content)?;
        request.validate()?;
        Ok(request)
    }

    /// Check the parts of a request the renderer cannot check for itself
    ///
    /// The name becomes both a class name and a file name, so it must be a
    /// plain identifier.
    pub fn validate(&self) -> Result<(), RequestError> {
        match &self.name {
            Some(name) if !is_identifier(name) => Err(RequestError::InvalidName(name.clone())),
            _ => Ok(()),
        }
    }

    /// Set the class name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an inject block
    pub fn with_inject(mut self, block: InjectBlock) -> Self {
        self.inject.push(block);
        self
    }

    /// Build the render context, merging inject blocks after the request's
    /// own fragments
    pub fn to_context<'r>(&self, registry: &'r SlotRegistry) -> Context<'r> {
        let mut ctx = Context::new(registry);
        if let Some(name) = &self.name {
            ctx.set_scalar(slot::NAME, name.as_str());
        }

        let blocks = self.inject.as_slice();
        ctx.set_sequence(
            slot::BODY_INCLUDE_FILES,
            merge(&self.body_include_files, blocks, |b| b.body_includes.as_slice()),
        )
        .set_sequence(
            slot::INSTANCE_INITIALIZATION,
            merge(&self.instance_initialization, blocks, |b| {
                b.instance_initialization.as_slice()
            }),
        )
        .set_sequence(
            slot::CTOR_LINES,
            merge(&self.ctor_lines, blocks, |b| b.ctor_lines.as_slice()),
        )
        .set_sequence(slot::BOOK_CODE, self.book_code.clone())
        .set_sequence(
            slot::INITIALIZE_LINES,
            merge(&self.initialize_lines, blocks, |b| b.initialize_lines.as_slice()),
        )
        .set_sequence(slot::QUERY_CODE, self.query_code.clone())
        .set_sequence(
            slot::HEADER_INCLUDE_FILES,
            merge(&self.header_include_files, blocks, |b| b.header_includes.as_slice()),
        )
        .set_sequence(
            slot::PRIVATE_MEMBERS,
            merge(&self.private_members, blocks, |b| b.private_members.as_slice()),
        );

        for block in &self.inject {
            tracing::debug!(block = block.name.as_deref().unwrap_or("<anon>"), "merged inject block");
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotValue;

    fn sequence(ctx: &Context<'_>, name: &str) -> Vec<String> {
        match ctx.resolve(name) {
            Some(SlotValue::Sequence(items)) => items.iter().map(|f| f.to_string()).collect(),
            other => panic!("Expected sequence for {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_parse_full_request() {
        let toml_str = r#"
name = "jets"
body_include_files = ["xAODJet/JetContainer.h"]
instance_initialization = ["m_count(0)"]
query_code = ["m_count++;"]

[[inject]]
name = "tool"
body_includes = ["Tool.h"]
ctor_lines = ["declareProperty(\"cut\", m_cut);"]
"#;
        let request = GenerationRequest::from_toml(toml_str).expect("Should parse");
        assert_eq!(request.name.as_deref(), Some("jets"));
        assert_eq!(request.inject.len(), 1);
        assert_eq!(request.inject[0].ctor_lines[0].as_str(), "declareProperty(\"cut\", m_cut);");
        assert!(request.book_code.is_empty());
    }

    #[test]
    fn test_empty_request() {
        let request = GenerationRequest::from_toml("").expect("Should parse");
        assert_eq!(request, GenerationRequest::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = GenerationRequest::from_toml("querycode = [\"x;\"]");
        assert!(matches!(result, Err(RequestError::ParseError(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = GenerationRequest::from_toml("query_code = \"x;\"");
        assert!(matches!(result, Err(RequestError::ParseError(_))));
    }

    #[test]
    fn test_invalid_name_rejected() {
        for bad in ["../evil", "1query", "my query", ""] {
            let result = GenerationRequest::from_toml(&format!("name = {:?}", bad));
            assert!(
                matches!(result, Err(RequestError::InvalidName(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(GenerationRequest::new().with_name("_q1").validate().is_ok());
    }

    #[test]
    fn test_inject_blocks_merge_after_own_fragments() {
        let request = GenerationRequest {
            body_include_files: vec!["own.h".into()],
            ctor_lines: vec!["own;".into()],
            ..Default::default()
        }
        .with_inject(InjectBlock {
            body_includes: vec!["first.h".into()],
            ctor_lines: vec!["first;".into()],
            ..Default::default()
        })
        .with_inject(InjectBlock {
            body_includes: vec!["second.h".into()],
            ..Default::default()
        });

        let registry = SlotRegistry::standard();
        let ctx = request.to_context(&registry);
        assert_eq!(
            sequence(&ctx, slot::BODY_INCLUDE_FILES),
            vec!["own.h", "first.h", "second.h"]
        );
        assert_eq!(sequence(&ctx, slot::CTOR_LINES), vec!["own;", "first;"]);
        assert!(sequence(&ctx, slot::QUERY_CODE).is_empty());
    }

    #[test]
    fn test_name_defaults_from_registry() {
        let registry = SlotRegistry::standard();
        let ctx = GenerationRequest::new().to_context(&registry);
        assert_eq!(
            ctx.resolve(slot::NAME),
            Some(&SlotValue::Scalar("query".to_string()))
        );
    }
}
