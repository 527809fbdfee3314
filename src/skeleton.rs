//! The algorithm skeleton: bundled templates and lifecycle conformance
//!
//! A skeleton is a set of template files rendered against the same context.
//! The bundled one produces a source/header pair for an event-loop algorithm
//! with the four lifecycle phases (construct, initialize, execute, finalize).

use thiserror::Error;

use crate::error::TemplateSyntaxError;
use crate::parser::{parse, Template};

/// Bundled algorithm source template
pub const QUERY_SOURCE: &str = include_str!("../templates/query.cxx");
/// Bundled algorithm header template
pub const QUERY_HEADER: &str = include_str!("../templates/query.h");

/// The phases the host framework drives through status-code methods, in
/// the order they must appear
pub const STATUS_PHASES: [&str; 3] = ["initialize", "execute", "finalize"];

/// A rendered file does not satisfy the lifecycle contract
#[derive(Debug, Error, PartialEq)]
pub enum ConformanceError {
    #[error("no constructor '{class} :: {class} (const std::string& name, ISvcLocator *pSvcLocator)'")]
    MissingConstructor { class: String },

    #[error("constructor for '{class}' is defined more than once")]
    DuplicateConstructor { class: String },

    #[error("phase '{phase}' is not defined as 'StatusCode {class} :: {phase} ()'")]
    MissingPhase { class: String, phase: String },

    #[error("phase '{phase}' is defined more than once")]
    DuplicatePhase { phase: String },

    #[error("phase '{later}' is defined before '{earlier}'")]
    PhaseOrder { earlier: String, later: String },
}

/// One template of a skeleton
#[derive(Debug, Clone)]
pub struct SkeletonFile {
    /// Appended to the algorithm name to form the output file name
    pub suffix: String,
    /// Template text, kept for diagnostics
    pub source: String,
    /// Parsed template
    pub template: Template,
    /// Whether the rendered file must define the lifecycle methods
    pub defines_lifecycle: bool,
}

impl SkeletonFile {
    /// Output file name for a given algorithm name
    pub fn file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.suffix)
    }
}

/// An ordered set of templates rendered together
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    files: Vec<SkeletonFile>,
}

impl Skeleton {
    /// Create a skeleton with no files
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled source + header skeleton
    pub fn bundled() -> Result<Self, (String, Vec<TemplateSyntaxError>)> {
        let mut skeleton = Self::new();
        skeleton
            .add_file(".cxx", QUERY_SOURCE, true)
            .map_err(|e| (".cxx".to_string(), e))?;
        skeleton
            .add_file(".h", QUERY_HEADER, false)
            .map_err(|e| (".h".to_string(), e))?;
        Ok(skeleton)
    }

    /// Parse and add a template file
    pub fn add_file(
        &mut self,
        suffix: impl Into<String>,
        source: impl Into<String>,
        defines_lifecycle: bool,
    ) -> Result<(), Vec<TemplateSyntaxError>> {
        let source = source.into();
        let template = parse(&source)?;
        self.files.push(SkeletonFile {
            suffix: suffix.into(),
            source,
            template,
            defines_lifecycle,
        });
        Ok(())
    }

    /// Replace the template of the file with the given suffix, or add it
    pub fn replace_file(
        &mut self,
        suffix: &str,
        source: impl Into<String>,
        defines_lifecycle: bool,
    ) -> Result<(), Vec<TemplateSyntaxError>> {
        let source = source.into();
        let template = parse(&source)?;
        let file = SkeletonFile {
            suffix: suffix.to_string(),
            source,
            template,
            defines_lifecycle,
        };
        match self.files.iter_mut().find(|f| f.suffix == suffix) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
        Ok(())
    }

    pub fn files(&self) -> &[SkeletonFile] {
        &self.files
    }

    pub fn file(&self, suffix: &str) -> Option<&SkeletonFile> {
        self.files.iter().find(|f| f.suffix == suffix)
    }
}

/// Collapse all whitespace runs to a single space
fn normalize(source: &str) -> String {
    source.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check that rendered source defines the lifecycle of `class`
///
/// The constructor must take `(name, service locator)` and each of
/// `initialize`, `execute`, `finalize` must be defined exactly once, returning
/// `StatusCode`, in that order.
pub fn check_conformance(source: &str, class: &str) -> Result<(), ConformanceError> {
    let text = normalize(source);

    let ctor = format!(
        "{c} :: {c} (const std::string& name, ISvcLocator *pSvcLocator)",
        c = class
    );
    match text.matches(&ctor).count() {
        0 => {
            return Err(ConformanceError::MissingConstructor {
                class: class.to_string(),
            })
        }
        1 => {}
        _ => {
            return Err(ConformanceError::DuplicateConstructor {
                class: class.to_string(),
            })
        }
    }

    let mut previous: Option<(&str, usize)> = None;
    for phase in STATUS_PHASES {
        let signature = format!("StatusCode {} :: {} ()", class, phase);
        let positions: Vec<usize> = text.match_indices(&signature).map(|(i, _)| i).collect();
        let at = match positions.as_slice() {
            [] => {
                return Err(ConformanceError::MissingPhase {
                    class: class.to_string(),
                    phase: phase.to_string(),
                })
            }
            [at] => *at,
            _ => {
                return Err(ConformanceError::DuplicatePhase {
                    phase: phase.to_string(),
                })
            }
        };
        if let Some((earlier, earlier_at)) = previous {
            if at < earlier_at {
                return Err(ConformanceError::PhaseOrder {
                    earlier: earlier.to_string(),
                    later: phase.to_string(),
                });
            }
        }
        previous = Some((phase, at));
    }

    Ok(())
}
