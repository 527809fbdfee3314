//! Slot registry: the named injection points a skeleton template may use

use std::collections::HashMap;
use thiserror::Error;

use crate::fragment::Fragment;

/// Header includes for the generated source file, one path per entry
pub const BODY_INCLUDE_FILES: &str = "body_include_files";
/// Member initializers appended after the base-class initializer
pub const INSTANCE_INITIALIZATION: &str = "instance_initialization";
/// Constructor body statements, after the fixed boilerplate
pub const CTOR_LINES: &str = "ctor_lines";
/// First segment of `initialize()`
pub const BOOK_CODE: &str = "book_code";
/// Second segment of `initialize()`
pub const INITIALIZE_LINES: &str = "initialize_lines";
/// Whole body of `execute()`
pub const QUERY_CODE: &str = "query_code";
/// Include paths for the generated header
pub const HEADER_INCLUDE_FILES: &str = "header_include_files";
/// Private member declarations in the generated class
pub const PRIVATE_MEMBERS: &str = "private_members";
/// Class name of the generated algorithm
pub const NAME: &str = "name";
/// `true`/`false` argument of the file-access telemetry switch
pub const FILE_ACCESS_TELEMETRY: &str = "file_access_telemetry";

/// Default class name when the request does not name one
pub const DEFAULT_NAME: &str = "query";

/// Errors that can occur while declaring slots
#[derive(Debug, Error, PartialEq)]
pub enum SlotError {
    /// Two slots with the same name
    #[error("duplicate slot declaration: {name}")]
    Duplicate { name: String },

    /// Default value does not match the declared cardinality
    #[error("default for slot '{name}' is a {found}, but the slot is a {expected}")]
    DefaultKindMismatch {
        name: String,
        expected: SlotKind,
        found: SlotKind,
    },
}

/// Cardinality of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A single string
    Scalar,
    /// An ordered list of fragments
    Sequence,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Scalar => write!(f, "scalar"),
            SlotKind::Sequence => write!(f, "sequence"),
        }
    }
}

/// A concrete value bound to a slot for one render
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Scalar(String),
    Sequence(Vec<Fragment>),
}

impl SlotValue {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotValue::Scalar(_) => SlotKind::Scalar,
            SlotValue::Sequence(_) => SlotKind::Sequence,
        }
    }
}

/// A declared slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDecl {
    pub name: String,
    pub kind: SlotKind,
    /// Value used when the context has no entry; `None` makes the slot required
    pub default: Option<SlotValue>,
}

impl SlotDecl {
    /// A sequence slot, defaulting to the empty list
    pub fn sequence(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Sequence,
            default: Some(SlotValue::Sequence(Vec::new())),
        }
    }

    /// A required scalar slot
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Scalar,
            default: None,
        }
    }

    /// An optional scalar slot, rendering as the empty string when absent
    pub fn optional_scalar(name: impl Into<String>) -> Self {
        Self::scalar(name).with_default(SlotValue::Scalar(String::new()))
    }

    pub fn with_default(mut self, default: SlotValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Make the slot required
    pub fn without_default(mut self) -> Self {
        self.default = None;
        self
    }
}

/// Registry of declared slots, in declaration order
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    slots: Vec<SlotDecl>,
    index: HashMap<String, usize>,
}

impl SlotRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The slots of the bundled algorithm skeleton
    pub fn standard() -> Self {
        let decls = [
            SlotDecl::scalar(NAME).with_default(SlotValue::Scalar(DEFAULT_NAME.to_string())),
            SlotDecl::scalar(FILE_ACCESS_TELEMETRY)
                .with_default(SlotValue::Scalar("false".to_string())),
            SlotDecl::sequence(BODY_INCLUDE_FILES),
            SlotDecl::sequence(INSTANCE_INITIALIZATION),
            SlotDecl::sequence(CTOR_LINES),
            SlotDecl::sequence(BOOK_CODE),
            SlotDecl::sequence(INITIALIZE_LINES),
            SlotDecl::sequence(QUERY_CODE),
            SlotDecl::sequence(HEADER_INCLUDE_FILES),
            SlotDecl::sequence(PRIVATE_MEMBERS),
        ];

        let mut registry = Self::new();
        for decl in decls {
            // Names above are distinct and defaults match their kinds
            let _ = registry.declare(decl);
        }
        registry
    }

    /// Declare a slot
    pub fn declare(&mut self, decl: SlotDecl) -> Result<(), SlotError> {
        if self.index.contains_key(&decl.name) {
            return Err(SlotError::Duplicate { name: decl.name });
        }
        if let Some(default) = &decl.default {
            if default.kind() != decl.kind {
                return Err(SlotError::DefaultKindMismatch {
                    name: decl.name,
                    expected: decl.kind,
                    found: default.kind(),
                });
            }
        }
        self.index.insert(decl.name.clone(), self.slots.len());
        self.slots.push(decl);
        Ok(())
    }

    /// Get a slot by name
    pub fn get(&self, name: &str) -> Option<&SlotDecl> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    /// Check if a slot is declared
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All slot names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotDecl> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_slots() {
        let registry = SlotRegistry::standard();
        for name in [
            BODY_INCLUDE_FILES,
            INSTANCE_INITIALIZATION,
            CTOR_LINES,
            BOOK_CODE,
            INITIALIZE_LINES,
            QUERY_CODE,
        ] {
            let slot = registry.get(name).expect("standard slot");
            assert_eq!(slot.kind, SlotKind::Sequence);
            assert_eq!(slot.default, Some(SlotValue::Sequence(vec![])));
        }
        assert_eq!(registry.get(NAME).map(|s| s.kind), Some(SlotKind::Scalar));
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_registry_duplicate_error() {
        let mut registry = SlotRegistry::new();
        registry
            .declare(SlotDecl::sequence("query_code"))
            .expect("First declare should succeed");
        let result = registry.declare(SlotDecl::scalar("query_code"));
        assert_eq!(
            result,
            Err(SlotError::Duplicate {
                name: "query_code".to_string()
            })
        );
    }

    #[test]
    fn test_default_kind_mismatch() {
        let mut registry = SlotRegistry::new();
        let decl = SlotDecl::sequence("xs").with_default(SlotValue::Scalar("x".to_string()));
        assert!(matches!(
            registry.declare(decl),
            Err(SlotError::DefaultKindMismatch { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_in_declaration_order() {
        let mut registry = SlotRegistry::new();
        registry.declare(SlotDecl::sequence("b")).unwrap();
        registry.declare(SlotDecl::optional_scalar("a")).unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_required_scalar_has_no_default() {
        let decl = SlotDecl::scalar("name");
        assert!(decl.default.is_none());
        let decl = SlotDecl::optional_scalar("name").without_default();
        assert!(decl.default.is_none());
    }
}
