//! slotgen - Slot-based source generation for event-loop analysis algorithms
//!
//! This library provides a small template language (`{{ name }}` substitution
//! and `{% for x in seq %}` iteration), a typed slot registry, and a
//! generator that renders a source/header pair for an algorithm following the
//! construct, initialize, execute, finalize lifecycle.
//!
//! # Example
//!
//! ```rust
//! use slotgen::{generate, GenerationRequest};
//!
//! let request = GenerationRequest::from_toml(r#"
//! name = "jets"
//! query_code = ["m_count++;"]
//! "#).unwrap();
//!
//! let files = generate(&request).unwrap();
//! assert!(files.contents("jets.cxx").unwrap().contains("m_count++;"));
//! assert!(files.contents("jets.h").is_some());
//! ```

pub mod context;
pub mod error;
pub mod fragment;
pub mod lifecycle;
pub mod output;
pub mod parser;
pub mod render;
pub mod request;
pub mod skeleton;
pub mod slot;

pub use context::Context;
pub use error::TemplateSyntaxError;
pub use fragment::{Fragment, SourceEmitter};
pub use lifecycle::{
    Algorithm, ContinuationPolicy, EventLoop, FinalizePolicy, LifecycleError, LifecycleTracker,
    Phase, RunReport, StatusCode,
};
pub use output::{GeneratedFile, GeneratedFiles, WriteError};
pub use parser::{parse, Template};
pub use render::{check, render, RenderError};
pub use request::{GenerationRequest, InjectBlock, RequestError};
pub use skeleton::{check_conformance, ConformanceError, Skeleton};
pub use slot::{SlotDecl, SlotKind, SlotRegistry, SlotValue};

use thiserror::Error;

/// Errors that can occur during generation
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A template failed to parse
    #[error("syntax errors in template for {file}: {}", format_errors(.errors))]
    Syntax {
        file: String,
        template: String,
        errors: Vec<TemplateSyntaxError>,
    },

    /// A template references slots the registry does not declare, or uses
    /// them with the wrong cardinality
    #[error("template for {file} does not match the slot registry: {}", format_errors(.errors))]
    Slots {
        file: String,
        template: String,
        errors: Vec<RenderError>,
    },

    /// Rendering failed
    #[error("rendering {file}: {error}")]
    Render {
        file: String,
        template: String,
        #[source]
        error: RenderError,
    },

    /// Rendered source does not define the lifecycle methods
    #[error("{file} breaks the algorithm lifecycle: {error}")]
    Conformance {
        file: String,
        #[source]
        error: ConformanceError,
    },

    #[error("request error: {0}")]
    Request(#[from] RequestError),

    #[error("output error: {0}")]
    Write(#[from] WriteError),
}

fn format_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl GenerateError {
    /// Format the error with template context where there is one
    pub fn report(&self) -> String {
        match self {
            GenerateError::Syntax {
                file,
                template,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(template, file))
                .collect::<Vec<_>>()
                .join("\n"),
            GenerateError::Slots {
                file,
                template,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(template, file))
                .collect::<Vec<_>>()
                .join("\n"),
            GenerateError::Render {
                file,
                template,
                error,
            } => error.format(template, file),
            other => other.to_string(),
        }
    }
}

/// Configuration for the generator
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Argument of the file-access telemetry switch in the constructor
    pub file_access_telemetry: bool,
    /// Check rendered sources for the lifecycle methods
    pub check_conformance: bool,
    /// Replacement for the bundled source template
    pub source_template: Option<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            file_access_telemetry: false,
            check_conformance: true,
            source_template: None,
        }
    }
}

impl GenerateConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable file-access telemetry in generated code
    pub fn with_file_access_telemetry(mut self, enabled: bool) -> Self {
        self.file_access_telemetry = enabled;
        self
    }

    /// Enable or disable the lifecycle conformance check
    pub fn with_conformance_check(mut self, enabled: bool) -> Self {
        self.check_conformance = enabled;
        self
    }

    /// Use a custom source template instead of the bundled one
    pub fn with_source_template(mut self, template: impl Into<String>) -> Self {
        self.source_template = Some(template.into());
        self
    }
}

/// Suffix of the file that defines the algorithm lifecycle
pub const SOURCE_SUFFIX: &str = ".cxx";

/// Renders a skeleton against requests
///
/// Templates are parsed and checked against the registry once, when the
/// generator is built. Every call to [`Generator::generate`] renders all files
/// in memory; nothing is returned unless every file rendered.
#[derive(Debug, Clone)]
pub struct Generator {
    skeleton: Skeleton,
    registry: SlotRegistry,
    config: GenerateConfig,
}

impl Generator {
    /// Build a generator over the bundled skeleton and the standard slots
    pub fn new(config: GenerateConfig) -> Result<Self, GenerateError> {
        let mut skeleton = Skeleton::bundled().map_err(|(suffix, errors)| {
            let template = match suffix.as_str() {
                SOURCE_SUFFIX => crate::skeleton::QUERY_SOURCE,
                _ => crate::skeleton::QUERY_HEADER,
            };
            GenerateError::Syntax {
                file: suffix,
                template: template.to_string(),
                errors,
            }
        })?;

        if let Some(source) = &config.source_template {
            skeleton
                .replace_file(SOURCE_SUFFIX, source.as_str(), true)
                .map_err(|errors| GenerateError::Syntax {
                    file: SOURCE_SUFFIX.to_string(),
                    template: source.clone(),
                    errors,
                })?;
        }

        Self::with_skeleton(skeleton, SlotRegistry::standard(), config)
    }

    /// Build a generator over a custom skeleton and registry
    ///
    /// Fails if any template references an undeclared slot or uses a slot
    /// with the wrong cardinality.
    pub fn with_skeleton(
        skeleton: Skeleton,
        registry: SlotRegistry,
        config: GenerateConfig,
    ) -> Result<Self, GenerateError> {
        for file in skeleton.files() {
            check(&file.template, &registry).map_err(|errors| GenerateError::Slots {
                file: file.suffix.clone(),
                template: file.source.clone(),
                errors,
            })?;
        }
        tracing::debug!(
            files = skeleton.files().len(),
            slots = registry.len(),
            "generator ready"
        );
        Ok(Self {
            skeleton,
            registry,
            config,
        })
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Render every file for a request
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedFiles, GenerateError> {
        request.validate()?;
        let mut ctx = request.to_context(&self.registry);
        if self.registry.contains(slot::FILE_ACCESS_TELEMETRY) {
            let telemetry = if self.config.file_access_telemetry {
                "true"
            } else {
                "false"
            };
            ctx.set_scalar(slot::FILE_ACCESS_TELEMETRY, telemetry);
        }
        self.generate_context(&ctx)
    }

    /// Render every file against a prepared context
    ///
    /// The context is used as given; configuration-derived slots such as the
    /// telemetry switch are only filled in by [`Generator::generate`].
    pub fn generate_context(&self, ctx: &Context<'_>) -> Result<GeneratedFiles, GenerateError> {
        let name = match ctx.resolve(slot::NAME) {
            Some(SlotValue::Scalar(name)) => name.as_str(),
            _ => slot::DEFAULT_NAME,
        };
        if !request::is_identifier(name) {
            return Err(RequestError::InvalidName(name.to_string()).into());
        }

        let mut files = Vec::with_capacity(self.skeleton.files().len());
        for file in self.skeleton.files() {
            let file_name = file.file_name(name);
            let contents = render(&file.template, ctx).map_err(|error| GenerateError::Render {
                file: file_name.clone(),
                template: file.source.clone(),
                error,
            })?;

            if file.defines_lifecycle && self.config.check_conformance {
                check_conformance(&contents, name).map_err(|error| {
                    GenerateError::Conformance {
                        file: file_name.clone(),
                        error,
                    }
                })?;
            }

            tracing::debug!(file = %file_name, bytes = contents.len(), "rendered");
            files.push(GeneratedFile {
                name: file_name,
                contents,
            });
        }
        Ok(GeneratedFiles::new(files))
    }
}

/// Render a request with the bundled skeleton and default configuration
pub fn generate(request: &GenerationRequest) -> Result<GeneratedFiles, GenerateError> {
    generate_with_config(request, GenerateConfig::default())
}

/// Render a request with the bundled skeleton and custom configuration
///
/// # Example
///
/// ```rust
/// use slotgen::{generate_with_config, GenerateConfig, GenerationRequest};
///
/// let config = GenerateConfig::new().with_file_access_telemetry(true);
/// let files = generate_with_config(&GenerationRequest::new(), config).unwrap();
///
/// let source = files.contents("query.cxx").unwrap();
/// assert!(source.contains("enableDataSubmission(true);"));
/// ```
pub fn generate_with_config(
    request: &GenerationRequest,
    config: GenerateConfig,
) -> Result<GeneratedFiles, GenerateError> {
    Generator::new(config)?.generate(request)
}
