pub mod line;
pub mod operation;
pub mod parser;

use std::ops::Range;

use crate::line::Line;
use crate::parser::ParseError;

/// A block identifier. Blocks are numbered `0..N` when the table is built.
pub type Block = usize;

/// A classified input line together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedLine {
    pub line: Line,
    /// Byte span of the trimmed line in source.
    pub span: Range<usize>,
}

/// A parsed command file.
#[derive(Debug, Clone)]
pub struct Script {
    /// Lines in source order, up to (not including) the first `quit`.
    pub lines: Vec<SpannedLine>,
    /// Warnings for lines that were ignored.
    pub warnings: Vec<ParseError>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Script {
    /// All command operations in the script, in order.
    pub fn operations(&self) -> impl Iterator<Item = &operation::Operation> {
        self.lines.iter().filter_map(|l| match &l.line {
            Line::Command(op) => Some(op),
            _ => None,
        })
    }
}
