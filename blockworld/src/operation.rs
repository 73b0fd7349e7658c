use std::fmt;
use std::str::FromStr;

use crate::Block;

/// The four arm instructions. The first word picks whether the blocks
/// resting on `a` travel with it; the second whether `b` is cleared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `move a onto b`
    MoveOnto,
    /// `move a over b`
    MoveOver,
    /// `pile a onto b`
    PileOnto,
    /// `pile a over b`
    PileOver,
}

impl OperationKind {
    /// Build a kind from its two grammar words (already lowercased).
    pub fn from_words(verb: &str, preposition: &str) -> Option<Self> {
        match (verb, preposition) {
            ("move", "onto") => Some(OperationKind::MoveOnto),
            ("move", "over") => Some(OperationKind::MoveOver),
            ("pile", "onto") => Some(OperationKind::PileOnto),
            ("pile", "over") => Some(OperationKind::PileOver),
            _ => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::MoveOnto | OperationKind::MoveOver => "move",
            OperationKind::PileOnto | OperationKind::PileOver => "pile",
        }
    }

    pub fn preposition(&self) -> &'static str {
        match self {
            OperationKind::MoveOnto | OperationKind::PileOnto => "onto",
            OperationKind::MoveOver | OperationKind::PileOver => "over",
        }
    }

    /// True for the `onto` forms: everything above `b` goes home first.
    pub fn clears_destination(&self) -> bool {
        matches!(self, OperationKind::MoveOnto | OperationKind::PileOnto)
    }

    /// True for the `pile` forms: `a` travels with everything above it.
    pub fn carries_tower(&self) -> bool {
        matches!(self, OperationKind::PileOnto | OperationKind::PileOver)
    }
}

/// A parsed instruction: apply `kind` to blocks `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub kind: OperationKind,
    pub a: Block,
    pub b: Block,
}

impl Operation {
    pub fn new(kind: OperationKind, a: Block, b: Block) -> Self {
        Operation { kind, a, b }
    }

    /// Both blocks exist on a table of `block_count` blocks.
    pub fn in_range(&self, block_count: usize) -> bool {
        self.a < block_count && self.b < block_count
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.kind.verb(),
            self.a,
            self.kind.preposition(),
            self.b
        )
    }
}

/// Why a line is not a `(move|pile) <a> (onto|over) <b>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    WrongTokenCount(usize),
    UnknownVerb(String),
    UnknownPreposition(String),
    NotABlock(String),
}

impl fmt::Display for InvalidOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidOperation::WrongTokenCount(n) => {
                write!(f, "expected 4 words, found {}", n)
            }
            InvalidOperation::UnknownVerb(w) => {
                write!(f, "expected `move` or `pile`, found `{}`", w)
            }
            InvalidOperation::UnknownPreposition(w) => {
                write!(f, "expected `onto` or `over`, found `{}`", w)
            }
            InvalidOperation::NotABlock(w) => write!(f, "`{}` is not a block number", w),
        }
    }
}

impl std::error::Error for InvalidOperation {}

impl FromStr for Operation {
    type Err = InvalidOperation;

    /// Parse `(move|pile) <a> (onto|over) <b>`, case-insensitively, with any
    /// run of whitespace between the words.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let [verb, a, preposition, b] = words[..] else {
            return Err(InvalidOperation::WrongTokenCount(words.len()));
        };

        if verb != "move" && verb != "pile" {
            return Err(InvalidOperation::UnknownVerb(verb.to_string()));
        }
        let kind = OperationKind::from_words(verb, preposition)
            .ok_or_else(|| InvalidOperation::UnknownPreposition(preposition.to_string()))?;

        Ok(Operation {
            kind,
            a: parse_block(a)?,
            b: parse_block(b)?,
        })
    }
}

/// Digits only: no sign, no decimal point. Values too large for a `Block`
/// are rejected as well.
fn parse_block(word: &str) -> Result<Block, InvalidOperation> {
    if word.is_empty() || !word.bytes().all(|c| c.is_ascii_digit()) {
        return Err(InvalidOperation::NotABlock(word.to_string()));
    }
    word.parse()
        .map_err(|_| InvalidOperation::NotABlock(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_four_kinds() {
        let cases = [
            ("move 0 onto 9", OperationKind::MoveOnto),
            ("move 0 over 9", OperationKind::MoveOver),
            ("pile 0 onto 9", OperationKind::PileOnto),
            ("pile 0 over 9", OperationKind::PileOver),
        ];
        for (src, kind) in cases {
            let op: Operation = src.parse().unwrap();
            assert_eq!(op, Operation::new(kind, 0, 9), "{}", src);
        }
    }

    #[test]
    fn display_reproduces_the_command() {
        let op: Operation = "move 3 onto 4".parse().unwrap();
        assert_eq!(op, Operation::new(OperationKind::MoveOnto, 3, 4));
        assert_eq!(op.to_string(), "move 3 onto 4");
        assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        let op: Operation = "  PILE   12\tOvEr 3 ".parse().unwrap();
        assert_eq!(op, Operation::new(OperationKind::PileOver, 12, 3));
        assert_eq!(op.to_string(), "pile 12 over 3");
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(
            "move 1 onto".parse::<Operation>(),
            Err(InvalidOperation::WrongTokenCount(3))
        );
        assert_eq!(
            "push 1 onto 2".parse::<Operation>(),
            Err(InvalidOperation::UnknownVerb("push".into()))
        );
        assert_eq!(
            "move 1 under 2".parse::<Operation>(),
            Err(InvalidOperation::UnknownPreposition("under".into()))
        );
        assert_eq!(
            "move -1 onto 2".parse::<Operation>(),
            Err(InvalidOperation::NotABlock("-1".into()))
        );
        assert_eq!(
            "move 1 onto 2.0".parse::<Operation>(),
            Err(InvalidOperation::NotABlock("2.0".into()))
        );
        assert!("move 1 onto 99999999999999999999999".parse::<Operation>().is_err());
        assert!("move 1 onto 2 please".parse::<Operation>().is_err());
    }

    #[test]
    fn kind_predicates() {
        assert!(OperationKind::MoveOnto.clears_destination());
        assert!(!OperationKind::MoveOnto.carries_tower());
        assert!(OperationKind::PileOver.carries_tower());
        assert!(!OperationKind::PileOver.clears_destination());
        assert_eq!(OperationKind::from_words("pile", "onto"), Some(OperationKind::PileOnto));
        assert_eq!(OperationKind::from_words("pile", "under"), None);
    }

    #[test]
    fn range_check() {
        let op = Operation::new(OperationKind::MoveOver, 3, 9);
        assert!(op.in_range(10));
        assert!(!op.in_range(9));
    }
}
