use blockworld::line::{Line, is_valid_block_count};
use blockworld::operation::Operation;
use blockworld::{Block, Script};

use crate::error::{ArmError, DiagnosticError};
use crate::report::Report;
use crate::table::Table;

/// The robot arm: a table of blocks and the queue of operations to run
/// against it.
///
/// Operations are queued by [`parse_command`](Self::parse_command) or
/// [`queue`](Self::queue) and applied in order by [`execute`](Self::execute).
#[derive(Debug, Default)]
pub struct BlockWorld {
    table: Table,
    pending: Vec<Operation>,
    /// Number of queued operations already applied to `table`.
    applied: usize,
}

impl BlockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh table of `block_count` singleton stacks.
    ///
    /// Queued operations are kept and will replay, from the first one,
    /// against the new table on the next [`execute`](Self::execute).
    pub fn initialize(&mut self, block_count: usize) -> Result<(), ArmError> {
        if !is_valid_block_count(block_count) {
            return Err(ArmError::InvalidBlockCount(block_count));
        }
        if !self.table.is_empty() {
            tracing::info!(
                blocks = block_count,
                queued = self.pending.len(),
                "re-initializing table"
            );
        } else {
            tracing::info!(blocks = block_count, "initializing table");
        }
        self.table = Table::new(block_count);
        self.applied = 0;
        Ok(())
    }

    pub fn block_count(&self) -> usize {
        self.table.len()
    }

    /// Parse a command line and queue it. Returns `None`, queueing nothing,
    /// when the line is not a command or names a block that does not exist.
    pub fn parse_command(&mut self, line: &str) -> Option<Operation> {
        let op = line.parse::<Operation>().ok()?;
        self.queue(op).then_some(op)
    }

    /// Queue an operation if both of its blocks exist.
    pub fn queue(&mut self, op: Operation) -> bool {
        if !op.in_range(self.block_count()) {
            tracing::debug!(%op, blocks = self.block_count(), "dropping out-of-range command");
            return false;
        }
        self.pending.push(op);
        true
    }

    pub fn pending(&self) -> &[Operation] {
        &self.pending
    }

    /// Feed every line of a parsed script through the engine: block counts
    /// (re)initialize, commands are queued. Returns a warning per command
    /// that was dropped for naming a block not on the table.
    pub fn load(&mut self, script: &Script) -> Vec<DiagnosticError> {
        let mut warnings = Vec::new();
        for spanned in &script.lines {
            match &spanned.line {
                Line::Init(n) => {
                    if let Err(error) = self.initialize(*n) {
                        warnings.push(DiagnosticError::warning(
                            "block count rejected; line ignored".to_string(),
                            error,
                            spanned.span.clone(),
                            script.source_id,
                        ));
                    }
                }
                Line::Command(op) => {
                    if !self.queue(*op) {
                        let missing = if op.a >= self.block_count() { op.a } else { op.b };
                        warnings.push(DiagnosticError::warning(
                            format!(
                                "command ignored: table has {} blocks",
                                self.block_count()
                            ),
                            ArmError::UnknownBlock(missing),
                            spanned.span.clone(),
                            script.source_id,
                        ));
                    }
                }
                Line::Quit => break,
                Line::Ignored => {}
            }
        }
        warnings
    }

    /// Apply every queued operation not yet applied to the current table, in
    /// order, and return the resulting stacks.
    ///
    /// Operations with `a == b`, with both blocks already in one stack, or
    /// naming a block the current table lacks (possible after
    /// re-initializing with fewer blocks) are skipped.
    pub fn execute(&mut self) -> &[Vec<Block>] {
        for op in &self.pending[self.applied..] {
            match self.table.apply(op) {
                Ok(true) => tracing::trace!(%op, "applied"),
                Ok(false) => tracing::debug!(%op, "skipped: blocks already share a stack"),
                Err(error) => tracing::debug!(%op, %error, "skipped"),
            }
        }
        self.applied = self.pending.len();
        self.table.stacks()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn report(&self) -> Report {
        Report::from_table(&self.table)
    }
}
