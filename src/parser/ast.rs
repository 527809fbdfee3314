//! Abstract Syntax Tree types for skeleton templates

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root AST node - a parsed template document
///
/// A template is immutable once parsed and can be rendered any number of
/// times against different contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Spanned<Node>>,
}

/// A single template node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, copied verbatim
    Text(String),
    /// `{{ name }}` scalar substitution
    Variable(Spanned<Identifier>),
    /// `{% for item in sequence %} ... {% endfor %}`
    For(ForBlock),
}

/// An iteration block
#[derive(Debug, Clone, PartialEq)]
pub struct ForBlock {
    /// Loop variable bound to each element in turn
    pub item: Spanned<Identifier>,
    /// Name of the sequence being iterated
    pub sequence: Spanned<Identifier>,
    /// Nested nodes rendered once per element
    pub body: Vec<Spanned<Node>>,
}

/// How a slot is referenced from a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Used in `{{ name }}`
    Scalar,
    /// Used as the sequence of a `for` block
    Sequence,
}

/// A reference to a name that is not bound by an enclosing loop
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRef<'a> {
    pub name: &'a Identifier,
    pub kind: RefKind,
    pub span: Span,
}

impl Template {
    /// All free slot references, in document order
    ///
    /// Names bound by an enclosing `for` are skipped, so `{{ l }}` inside
    /// `{% for l in ctor_lines %}` yields only the `ctor_lines` reference.
    pub fn slot_refs(&self) -> Vec<SlotRef<'_>> {
        let mut refs = Vec::new();
        let mut bound = Vec::new();
        collect_refs(&self.nodes, &mut bound, &mut refs);
        refs
    }

    /// Free slot names, deduplicated, in order of first use
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for r in self.slot_refs() {
            if !names.contains(&r.name.as_str()) {
                names.push(r.name.as_str());
            }
        }
        names
    }
}

fn collect_refs<'a>(
    nodes: &'a [Spanned<Node>],
    bound: &mut Vec<&'a str>,
    refs: &mut Vec<SlotRef<'a>>,
) {
    for node in nodes {
        match &node.node {
            Node::Text(_) => {}
            Node::Variable(name) => {
                if !bound.contains(&name.node.as_str()) {
                    refs.push(SlotRef {
                        name: &name.node,
                        kind: RefKind::Scalar,
                        span: name.span.clone(),
                    });
                }
            }
            Node::For(block) => {
                if !bound.contains(&block.sequence.node.as_str()) {
                    refs.push(SlotRef {
                        name: &block.sequence.node,
                        kind: RefKind::Sequence,
                        span: block.sequence.span.clone(),
                    });
                }
                bound.push(block.item.node.as_str());
                collect_refs(&block.body, bound, refs);
                bound.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanned<T>(node: T) -> Spanned<T> {
        Spanned::new(node, 0..1)
    }

    #[test]
    fn test_slot_refs_skip_loop_variables() {
        let template = Template {
            nodes: vec![
                spanned(Node::Variable(spanned(Identifier::new("name")))),
                spanned(Node::For(ForBlock {
                    item: spanned(Identifier::new("l")),
                    sequence: spanned(Identifier::new("ctor_lines")),
                    body: vec![spanned(Node::Variable(spanned(Identifier::new("l"))))],
                })),
            ],
        };

        let refs = template.slot_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name.as_str(), "name");
        assert_eq!(refs[0].kind, RefKind::Scalar);
        assert_eq!(refs[1].name.as_str(), "ctor_lines");
        assert_eq!(refs[1].kind, RefKind::Sequence);
    }

    #[test]
    fn test_slot_names_deduplicated() {
        let var = |n: &str| spanned(Node::Variable(spanned(Identifier::new(n))));
        let template = Template {
            nodes: vec![var("name"), var("other"), var("name")],
        };
        assert_eq!(template.slot_names(), vec!["name", "other"]);
    }

    #[test]
    fn test_loop_variable_scope_ends_with_block() {
        let template = Template {
            nodes: vec![
                spanned(Node::For(ForBlock {
                    item: spanned(Identifier::new("l")),
                    sequence: spanned(Identifier::new("query_code")),
                    body: vec![],
                })),
                spanned(Node::Variable(spanned(Identifier::new("l")))),
            ],
        };
        let names = template.slot_names();
        assert_eq!(names, vec!["query_code", "l"]);
    }
}
