//! Template renderer
//!
//! Rendering is a recursive walk over the immutable template AST. It reads
//! the context, never mutates it, and builds the output in a private buffer
//! that is only handed back when the whole template rendered: a failed
//! render produces no partial text.

mod error;

pub use error::RenderError;

use crate::context::Context;
use crate::fragment::Fragment;
use crate::parser::ast::{Node, RefKind, Spanned, Template};
use crate::slot::{SlotKind, SlotRegistry, SlotValue};

/// Loop variables currently in scope, innermost last
type Scope<'a> = Vec<(&'a str, &'a Fragment)>;

/// Render a parsed template against a context
///
/// # Example
///
/// ```rust
/// use slotgen::{parse, render, Context, SlotRegistry};
///
/// let template = parse("{% for l in query_code %}{{ l }}\n{% endfor %}").unwrap();
/// let registry = SlotRegistry::standard();
/// let ctx = Context::new(&registry).with_sequence("query_code", ["a;", "b;"]);
///
/// assert_eq!(render(&template, &ctx).unwrap(), "a;\nb;\n");
/// ```
pub fn render(template: &Template, ctx: &Context<'_>) -> Result<String, RenderError> {
    let mut out = String::new();
    let mut scope = Scope::new();
    render_nodes(&template.nodes, ctx, &mut scope, &mut out)?;
    tracing::debug!(bytes = out.len(), "rendered template");
    Ok(out)
}

fn lookup<'a>(scope: &Scope<'a>, name: &str) -> Option<&'a Fragment> {
    scope
        .iter()
        .rev()
        .find(|(bound, _)| *bound == name)
        .map(|(_, fragment)| *fragment)
}

fn render_nodes<'a>(
    nodes: &'a [Spanned<Node>],
    ctx: &'a Context<'_>,
    scope: &mut Scope<'a>,
    out: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        match &node.node {
            Node::Text(text) => out.push_str(text),

            Node::Variable(name) => {
                if let Some(fragment) = lookup(scope, name.node.as_str()) {
                    out.push_str(fragment.as_str());
                    continue;
                }
                match ctx.resolve(name.node.as_str()) {
                    Some(SlotValue::Scalar(s)) => out.push_str(s),
                    Some(SlotValue::Sequence(_)) => {
                        return Err(RenderError::slot_type(
                            name.node.as_str(),
                            SlotKind::Scalar,
                            SlotKind::Sequence,
                            name.span.clone(),
                        ))
                    }
                    None => {
                        return Err(RenderError::missing(
                            name.node.as_str(),
                            name.span.clone(),
                        ))
                    }
                }
            }

            Node::For(block) => {
                let sequence = &block.sequence;
                if lookup(scope, sequence.node.as_str()).is_some() {
                    // Loop variables are single fragments
                    return Err(RenderError::slot_type(
                        sequence.node.as_str(),
                        SlotKind::Sequence,
                        SlotKind::Scalar,
                        sequence.span.clone(),
                    ));
                }
                let items = match ctx.resolve(sequence.node.as_str()) {
                    Some(SlotValue::Sequence(items)) => items,
                    Some(SlotValue::Scalar(_)) => {
                        return Err(RenderError::slot_type(
                            sequence.node.as_str(),
                            SlotKind::Sequence,
                            SlotKind::Scalar,
                            sequence.span.clone(),
                        ))
                    }
                    None => {
                        return Err(RenderError::missing(
                            sequence.node.as_str(),
                            sequence.span.clone(),
                        ))
                    }
                };
                for item in items {
                    scope.push((block.item.node.as_str(), item));
                    render_nodes(&block.body, ctx, scope, out)?;
                    scope.pop();
                }
            }
        }
    }
    Ok(())
}

/// Check a template's free references against a registry without rendering
///
/// Every reference must name a declared slot whose kind matches its use.
/// Whether required slots are bound is only known at render time.
pub fn check(template: &Template, registry: &SlotRegistry) -> Result<(), Vec<RenderError>> {
    let errors: Vec<RenderError> = template
        .slot_refs()
        .into_iter()
        .filter_map(|r| {
            let expected = match r.kind {
                RefKind::Scalar => SlotKind::Scalar,
                RefKind::Sequence => SlotKind::Sequence,
            };
            match registry.get(r.name.as_str()) {
                None => Some(RenderError::missing(r.name.as_str(), r.span)),
                Some(decl) if decl.kind != expected => Some(RenderError::slot_type(
                    r.name.as_str(),
                    expected,
                    decl.kind,
                    r.span,
                )),
                Some(_) => None,
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
