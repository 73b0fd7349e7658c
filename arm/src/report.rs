use std::fmt;

use blockworld::Block;

use crate::table::Table;

/// The final arrangement, one entry per table position.
///
/// Renders as `"<i>: <ids bottom to top>"` per line, or just `"<i>"` for an
/// empty position.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub stacks: Vec<Vec<Block>>,
}

impl Report {
    pub fn from_table(table: &Table) -> Self {
        Report {
            stacks: table.stacks().to_vec(),
        }
    }

    /// One rendered line per position, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        self.stacks
            .iter()
            .enumerate()
            .map(|(index, stack)| render_stack(index, stack))
            .collect()
    }
}

fn render_stack(index: usize, stack: &[Block]) -> String {
    if stack.is_empty() {
        return index.to_string();
    }
    let blocks: Vec<String> = stack.iter().map(|b| b.to_string()).collect();
    format!("{}: {}", index, blocks.join(" "))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
