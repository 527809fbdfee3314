//! Lexer for skeleton templates
//!
//! Templates mix free text with tags, so lexing happens in two layers: a
//! scanner splits the source into literal text and `{{ }}` / `{% %}` / `{# #}`
//! tags, then the inside of each tag is tokenized with logos.

use logos::Logos;

use crate::error::TemplateSyntaxError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tokens that may appear between tag delimiters
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken {
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("endfor")]
    EndFor,

    // Identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

/// Token stream consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text between tags, after whitespace control
    Text(String),

    // Delimiters
    /// `{{`
    ExprOpen,
    /// `}}`
    ExprClose,
    /// `{%`
    StmtOpen,
    /// `%}`
    StmtClose,

    // Statement keywords
    For,
    In,
    EndFor,

    Ident(String),

    /// Anything inside a tag the template language does not support
    /// (filters, attribute access, literals, ...)
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TagKind {
    Expr,
    Stmt,
    Comment,
}

impl TagKind {
    fn from_marker(b: u8) -> Option<Self> {
        match b {
            b'{' => Some(TagKind::Expr),
            b'%' => Some(TagKind::Stmt),
            b'#' => Some(TagKind::Comment),
            _ => None,
        }
    }

    fn close(self) -> &'static str {
        match self {
            TagKind::Expr => "}}",
            TagKind::Stmt => "%}",
            TagKind::Comment => "#}",
        }
    }
}

/// Find the next tag opener in `input` starting at `from`
fn next_tag(input: &str, from: usize) -> Option<(usize, TagKind)> {
    let bytes = input.as_bytes();
    input[from..]
        .match_indices('{')
        .map(|(i, _)| from + i)
        .find_map(|at| {
            bytes
                .get(at + 1)
                .and_then(|&b| TagKind::from_marker(b))
                .map(|kind| (at, kind))
        })
}

/// Push a text token, applying `-` whitespace control on either side
fn push_text(
    tokens: &mut Vec<(Token, Span)>,
    input: &str,
    span: Span,
    trim_start: bool,
    trim_end: bool,
) {
    let mut start = span.start;
    let mut end = span.end;
    if trim_start {
        let text = &input[start..end];
        start += text.len() - text.trim_start().len();
    }
    if trim_end {
        let text = &input[start..end];
        end -= text.len() - text.trim_end().len();
    }
    if start < end {
        tokens.push((Token::Text(input[start..end].to_string()), start..end));
    }
}

/// Tokenize the inside of a `{{ }}` or `{% %}` tag
fn lex_tag(tokens: &mut Vec<(Token, Span)>, input: &str, inner: Span) {
    let offset = inner.start;
    for (tok, span) in TagToken::lexer(&input[inner]).spanned() {
        let span = offset + span.start..offset + span.end;
        let token = match tok {
            Ok(TagToken::For) => Token::For,
            Ok(TagToken::In) => Token::In,
            Ok(TagToken::EndFor) => Token::EndFor,
            Ok(TagToken::Ident(s)) => Token::Ident(s),
            Err(()) => Token::Unsupported(input[span.clone()].to_string()),
        };
        tokens.push((token, span));
    }
}

/// Lex template source into tokens with spans
///
/// Fails only when a tag is opened but never closed; everything else is left
/// for the grammar to judge.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, TemplateSyntaxError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while let Some((tag_start, kind)) = next_tag(input, pos) {
        let mut inner_start = tag_start + 2;
        let trim_left = input[inner_start..].starts_with('-');
        if trim_left {
            inner_start += 1;
        }
        push_text(&mut tokens, input, pos..tag_start, trim_next, trim_left);

        let close = kind.close();
        let close_at = input[inner_start..]
            .find(close)
            .map(|i| inner_start + i)
            .ok_or(TemplateSyntaxError::UnterminatedTag {
                span: tag_start..input.len(),
                close,
            })?;

        let mut inner_end = close_at;
        let trim_right = inner_end > inner_start && input[..inner_end].ends_with('-');
        if trim_right {
            inner_end -= 1;
        }
        let tag_end = close_at + close.len();

        match kind {
            TagKind::Expr => {
                tokens.push((Token::ExprOpen, tag_start..inner_start));
                lex_tag(&mut tokens, input, inner_start..inner_end);
                tokens.push((Token::ExprClose, inner_end..tag_end));
            }
            TagKind::Stmt => {
                tokens.push((Token::StmtOpen, tag_start..inner_start));
                lex_tag(&mut tokens, input, inner_start..inner_end);
                tokens.push((Token::StmtClose, inner_end..tag_end));
            }
            TagKind::Comment => {}
        }

        pos = tag_end;
        trim_next = trim_right;
    }

    push_text(&mut tokens, input, pos..input.len(), trim_next, false);
    Ok(tokens)
}
