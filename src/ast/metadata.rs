/// Half-open range of character offsets into the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// Diagnostic metadata attached to every node.
///
/// Metadata never participates in equality: two parses of the same
/// request compare equal even when the source text was spaced differently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metadata {
    pub span: Option<Span>,
}

impl Metadata {
    pub fn new(span: Span) -> Self {
        Metadata { span: Some(span) }
    }

    /// Metadata for nodes built by hand rather than parsed.
    pub fn synthetic() -> Self {
        Metadata::default()
    }
}

impl PartialEq for Metadata {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl From<Span> for Metadata {
    fn from(span: Span) -> Self {
        Metadata::new(span)
    }
}
