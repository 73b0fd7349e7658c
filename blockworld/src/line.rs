use crate::operation::Operation;

/// Block counts must be strictly below this.
pub const MAX_BLOCKS: usize = 25;

/// What a single line of a command file means.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// A block count: (re)build the table with this many blocks.
    Init(usize),
    /// `quit`: stop reading.
    Quit,
    /// A grammatical command. Its block ids are not range-checked here.
    Command(Operation),
    /// Anything else, including blank lines.
    Ignored,
}

impl Line {
    /// Classify one line. Surrounding whitespace and case are ignored.
    pub fn classify(text: &str) -> Line {
        let text = text.trim();

        if !text.is_empty() && text.bytes().all(|c| c.is_ascii_digit()) {
            return match text.parse::<usize>() {
                Ok(n) if is_valid_block_count(n) => Line::Init(n),
                _ => Line::Ignored,
            };
        }

        if text.eq_ignore_ascii_case("quit") {
            return Line::Quit;
        }

        match text.parse::<Operation>() {
            Ok(op) => Line::Command(op),
            Err(_) => Line::Ignored,
        }
    }
}

pub fn is_valid_block_count(n: usize) -> bool {
    n > 0 && n < MAX_BLOCKS
}
