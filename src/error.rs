//! Error types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A malformed template. Always fatal: nothing is rendered or written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateSyntaxError {
    /// A tag was opened but its closing delimiter never appears
    #[error("unterminated tag at {span:?}: missing `{close}`")]
    UnterminatedTag { span: Span, close: &'static str },

    /// A `for` block reaches end of input without `{% endfor %}`
    #[error("unterminated for block over '{sequence}' at {span:?}: missing `{{% endfor %}}`")]
    UnterminatedBlock { span: Span, sequence: String },

    /// An `{% endfor %}` with no open `for` block
    #[error("`{{% endfor %}}` at {span:?} has no matching `{{% for %}}`")]
    UnmatchedEndBlock { span: Span },

    /// Syntax the template language does not support (filters, attribute
    /// access, unknown statements, ...)
    #[error("unsupported syntax at {span:?}: {message}")]
    Unsupported { span: Span, message: String },

    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl TemplateSyntaxError {
    /// Source location of the error
    pub fn span(&self) -> &Span {
        match self {
            TemplateSyntaxError::UnterminatedTag { span, .. }
            | TemplateSyntaxError::UnterminatedBlock { span, .. }
            | TemplateSyntaxError::UnmatchedEndBlock { span }
            | TemplateSyntaxError::Unsupported { span, .. }
            | TemplateSyntaxError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let label = match self {
            TemplateSyntaxError::Syntax {
                message, expected, ..
            } if !expected.is_empty() => {
                format!("{}\nExpected: {}", message, expected.join(", "))
            }
            TemplateSyntaxError::UnterminatedBlock { .. } => "block opened here".to_string(),
            other => other.to_string(),
        };
        report(source, filename, self.span(), &self.to_string(), &label)
    }
}

/// Render an ariadne report for a single labelled span
pub(crate) fn report(
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
    label: &str,
) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for TemplateSyntaxError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use crate::parser::lexer::Token;
        use chumsky::error::RichReason;

        let span = err.span().into_range();

        // Unsupported input inside a tag gets its own error kind
        if let Some(Token::Unsupported(s)) = err.found() {
            return TemplateSyntaxError::Unsupported {
                span,
                message: format!("'{}' is not part of the template language", s),
            };
        }

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        TemplateSyntaxError::Syntax {
            span,
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
pub(crate) fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Text(_) => "literal text".to_string(),
        Token::ExprOpen => "'{{'".to_string(),
        Token::ExprClose => "'}}'".to_string(),
        Token::StmtOpen => "'{%'".to_string(),
        Token::StmtClose => "'%}'".to_string(),
        Token::For => "keyword 'for'".to_string(),
        Token::In => "keyword 'in'".to_string(),
        Token::EndFor => "keyword 'endfor'".to_string(),
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Unsupported(s) => format!("'{}'", s),
    }
}
