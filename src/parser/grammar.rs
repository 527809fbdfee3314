//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::TemplateSyntaxError;
use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template source into an AST
pub fn parse(input: &str) -> Result<Template, Vec<TemplateSyntaxError>> {
    let len = input.len();
    let tokens = crate::parser::lexer::lex(input).map_err(|e| vec![e])?;

    let errors = check_blocks(&tokens);
    if !errors.is_empty() {
        return Err(errors);
    }

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let template = template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect::<Vec<_>>())?;

    tracing::debug!(nodes = template.nodes.len(), "parsed template");
    Ok(template)
}

/// Match `for` openers against `endfor` closers and flag unsupported input
/// before the real parse
///
/// Chumsky would report these as a generic "unexpected token"; checking up
/// front gives each its own error kind and points at the right tag.
fn check_blocks(tokens: &[(Token, std::ops::Range<usize>)]) -> Vec<TemplateSyntaxError> {
    let mut errors = Vec::new();
    // (span of the opening tag, sequence name)
    let mut open: Vec<(std::ops::Range<usize>, String)> = Vec::new();

    for (i, (tok, span)) in tokens.iter().enumerate() {
        if let Token::Unsupported(s) = tok {
            errors.push(TemplateSyntaxError::Unsupported {
                span: span.clone(),
                message: format!("'{}' is not part of the template language", s),
            });
            continue;
        }
        if *tok != Token::StmtOpen {
            continue;
        }
        let tag_end = tokens[i..]
            .iter()
            .find(|(t, _)| *t == Token::StmtClose)
            .map(|(_, s)| s.end)
            .unwrap_or(span.end);
        let tag_span = span.start..tag_end;

        match tokens.get(i + 1) {
            Some((Token::For, _)) => {
                let sequence = match tokens.get(i + 4) {
                    Some((Token::Ident(s), _)) => s.clone(),
                    _ => String::new(),
                };
                open.push((tag_span, sequence));
            }
            Some((Token::EndFor, _)) => {
                if open.pop().is_none() {
                    errors.push(TemplateSyntaxError::UnmatchedEndBlock { span: tag_span });
                }
            }
            Some((Token::Ident(name), ident_span)) => {
                errors.push(TemplateSyntaxError::Unsupported {
                    span: ident_span.clone(),
                    message: format!("unknown statement '{}'", name),
                });
            }
            // Anything else is a plain syntax error, left to the grammar
            _ => {}
        }
    }

    for (span, sequence) in open.into_iter().rev() {
        errors.push(TemplateSyntaxError::UnterminatedBlock { span, sequence });
    }

    errors
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Template, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .labelled("identifier")
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let text = select! {
        Token::Text(s) => Node::Text(s),
    };

    // {{ name }}
    let variable = identifier
        .clone()
        .delimited_by(just(Token::ExprOpen), just(Token::ExprClose))
        .map(Node::Variable);

    // {% for item in sequence %}
    let for_open = just(Token::For)
        .ignore_then(identifier.clone())
        .then_ignore(just(Token::In))
        .then(identifier.clone())
        .delimited_by(just(Token::StmtOpen), just(Token::StmtClose));

    // {% endfor %}
    let for_close = just(Token::StmtOpen)
        .then(just(Token::EndFor))
        .then(just(Token::StmtClose))
        .ignored();

    let node = recursive(|node| {
        let for_block = for_open
            .clone()
            .then(node.repeated().collect::<Vec<_>>())
            .then_ignore(for_close.clone())
            .map(|((item, sequence), body)| {
                Node::For(ForBlock {
                    item,
                    sequence,
                    body,
                })
            });

        choice((text.clone(), variable.clone(), for_block))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Template { nodes })
}
