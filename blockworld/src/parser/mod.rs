pub mod error;

pub use error::ParseError;

use std::ops::Range;

use crate::line::{Line, MAX_BLOCKS};
use crate::operation::Operation;
use crate::{Script, SpannedLine};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Classify every line up to the first `quit`.
    ///
    /// Never fails: lines that are neither a block count, `quit`, nor a
    /// command are kept as [`Line::Ignored`] and reported as warnings.
    pub fn parse(&self) -> Script {
        let mut lines = Vec::new();
        let mut warnings = Vec::new();

        for (text, span) in line_spans(&self.source) {
            let line = Line::classify(text);
            match &line {
                Line::Quit => break,
                Line::Ignored if !text.is_empty() => {
                    warnings.push(self.ignored_warning(text, span.clone()));
                }
                _ => {}
            }
            lines.push(SpannedLine { line, span });
        }

        Script {
            lines,
            warnings,
            source_id: self.file_id,
        }
    }

    fn ignored_warning(&self, text: &str, span: Range<usize>) -> ParseError {
        if text.bytes().all(|c| c.is_ascii_digit()) {
            return ParseError::warning("block count out of range; line ignored", span, self.file_id)
                .with_note(format!("block counts must be between 1 and {}", MAX_BLOCKS - 1));
        }
        match text.parse::<Operation>() {
            Err(reason) => {
                ParseError::warning("unrecognized command; line ignored", span, self.file_id)
                    .with_note(reason.to_string())
                    .with_note("expected `(move|pile) <a> (onto|over) <b>`, a block count, or `quit`")
            }
            Ok(_) => ParseError::warning("line ignored", span, self.file_id),
        }
    }
}

/// Each line of `source` trimmed, with the byte span of the trimmed text.
fn line_spans(source: &str) -> impl Iterator<Item = (&str, Range<usize>)> {
    let mut offset = 0;
    source.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        (text, start + leading..start + leading + text.len())
    })
}
