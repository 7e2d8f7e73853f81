// A position within source text. The position represents a byte offset.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pos(pub u32);

// A half-open range of source text. The positions represent byte offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    /// A span with no useful location, used for errors that are not tied to
    /// a particular span of input text (e.g. "empty input").
    pub fn none() -> Self {
        Span {
            start: Pos(0),
            end: Pos(0),
        }
    }
}
