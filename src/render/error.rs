//! Error types for template rendering

use thiserror::Error;

use crate::parser::ast::Span;
use crate::slot::SlotKind;

/// Errors that can occur while rendering a template against a context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// Referenced slot is neither bound nor defaulted
    #[error("missing slot '{name}': not bound in the context and no default declared")]
    MissingSlot { name: String, span: Span },

    /// Slot value has the wrong cardinality for the reference
    #[error("slot '{name}' holds a {found} but is used as a {expected}")]
    SlotType {
        name: String,
        expected: SlotKind,
        found: SlotKind,
        span: Span,
    },
}

impl RenderError {
    pub fn missing(name: impl Into<String>, span: Span) -> Self {
        Self::MissingSlot {
            name: name.into(),
            span,
        }
    }

    pub fn slot_type(
        name: impl Into<String>,
        expected: SlotKind,
        found: SlotKind,
        span: Span,
    ) -> Self {
        Self::SlotType {
            name: name.into(),
            expected,
            found,
            span,
        }
    }

    /// Template location of the offending reference
    pub fn span(&self) -> &Span {
        match self {
            Self::MissingSlot { span, .. } | Self::SlotType { span, .. } => span,
        }
    }

    /// Name of the offending slot
    pub fn slot_name(&self) -> &str {
        match self {
            Self::MissingSlot { name, .. } | Self::SlotType { name, .. } => name,
        }
    }

    /// Format the error against the template source using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let label = match self {
            Self::MissingSlot { .. } => "referenced here".to_string(),
            Self::SlotType { expected, .. } => format!("used as a {} here", expected),
        };
        crate::error::report(source, filename, self.span(), &self.to_string(), &label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_slot_display() {
        let err = RenderError::missing("query_code", 3..13);
        assert!(err.to_string().contains("query_code"));
        assert_eq!(err.slot_name(), "query_code");
        assert_eq!(err.span(), &(3..13));
    }

    #[test]
    fn test_slot_type_display() {
        let err = RenderError::slot_type("name", SlotKind::Sequence, SlotKind::Scalar, 0..4);
        assert_eq!(
            err.to_string(),
            "slot 'name' holds a scalar but is used as a sequence"
        );
    }
}
