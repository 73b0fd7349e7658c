use blockworld::Block;
use blockworld::operation::{Operation, OperationKind};

use crate::error::ArmError;

/// The blocks on the table: one stack per table position, plus an index
/// from each block to the stack that holds it.
///
/// Every block `0..len()` sits in exactly one stack, exactly once, and
/// `positions[b]` names that stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Bottom to top.
    stacks: Vec<Vec<Block>>,
    positions: Vec<usize>,
}

impl Default for Table {
    fn default() -> Self {
        Table::new(0)
    }
}

impl Table {
    /// `block_count` singleton stacks; block `i` at position `i`.
    pub fn new(block_count: usize) -> Self {
        Table {
            stacks: (0..block_count).map(|b| vec![b]).collect(),
            positions: (0..block_count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn stack(&self, index: usize) -> Option<&[Block]> {
        self.stacks.get(index).map(|s| s.as_slice())
    }

    pub fn stacks(&self) -> &[Vec<Block>] {
        &self.stacks
    }

    pub fn contains(&self, block: Block) -> bool {
        block < self.positions.len()
    }

    pub fn position_of(&self, block: Block) -> Option<usize> {
        self.positions.get(block).copied()
    }

    pub fn same_stack(&self, a: Block, b: Block) -> bool {
        self.positions[a] == self.positions[b]
    }

    /// The table position a block returns to when knocked off a stack.
    ///
    /// Blocks and positions share one numbering: block `b` starts at
    /// position `b`. Only block `b` can ever land on an empty position `b`,
    /// so whenever `b` is above another block, position `b` is empty.
    pub fn home(block: Block) -> usize {
        block
    }

    /// (stack index, height within stack) of a block.
    fn locate(&self, block: Block) -> (usize, usize) {
        let stack = self.positions[block];
        let height = self.stacks[stack]
            .iter()
            .position(|&b| b == block)
            .expect("position index out of sync with stacks");
        (stack, height)
    }

    /// Return every block above `block` to its home position, leaving
    /// `block` on top of its stack. Returns the blocks moved, bottom first.
    pub fn unstack_above(&mut self, block: Block) -> Vec<Block> {
        let (stack, height) = self.locate(block);
        let above = self.stacks[stack].split_off(height + 1);
        for &b in &above {
            let home = Self::home(b);
            debug_assert!(self.stacks[home].is_empty(), "home of block {} occupied", b);
            self.stacks[home].push(b);
            self.positions[b] = home;
        }
        above
    }

    /// Put `a` alone on top of `b`'s stack, sending anything above `a` home.
    pub fn move_over(&mut self, a: Block, b: Block) {
        debug_assert!(!self.same_stack(a, b));
        self.unstack_above(a);
        let from = self.positions[a];
        self.stacks[from].pop();
        let to = self.positions[b];
        self.stacks[to].push(a);
        self.positions[a] = to;
    }

    /// Clear everything above `b`, then [`move_over`](Self::move_over).
    pub fn move_onto(&mut self, a: Block, b: Block) {
        self.unstack_above(b);
        self.move_over(a, b);
    }

    /// Carry `a` and everything above it, order intact, onto `b`'s stack.
    pub fn pile_over(&mut self, a: Block, b: Block) {
        debug_assert!(!self.same_stack(a, b));
        let (from, height) = self.locate(a);
        let tower = self.stacks[from].split_off(height);
        let to = self.positions[b];
        for &moved in &tower {
            self.positions[moved] = to;
        }
        self.stacks[to].extend(tower);
    }

    /// Clear everything above `b`, then [`pile_over`](Self::pile_over).
    pub fn pile_onto(&mut self, a: Block, b: Block) {
        self.unstack_above(b);
        self.pile_over(a, b);
    }

    /// Apply one operation. `Ok(false)` means it was a no-op: `a == b`, or
    /// both blocks already share a stack.
    pub fn apply(&mut self, op: &Operation) -> Result<bool, ArmError> {
        for block in [op.a, op.b] {
            if !self.contains(block) {
                return Err(ArmError::UnknownBlock(block));
            }
        }
        if op.a == op.b || self.same_stack(op.a, op.b) {
            return Ok(false);
        }

        match op.kind {
            OperationKind::MoveOnto => self.move_onto(op.a, op.b),
            OperationKind::MoveOver => self.move_over(op.a, op.b),
            OperationKind::PileOnto => self.pile_onto(op.a, op.b),
            OperationKind::PileOver => self.pile_over(op.a, op.b),
        }
        Ok(true)
    }

    /// Verify the partition and position-index invariants.
    pub fn check_invariant(&self) -> Result<(), ArmError> {
        let n = self.positions.len();
        if self.stacks.len() != n {
            return Err(ArmError::InvariantViolation(format!(
                "{} stacks for {} blocks",
                self.stacks.len(),
                n
            )));
        }

        let mut seen = vec![false; n];
        for (index, stack) in self.stacks.iter().enumerate() {
            for &block in stack {
                if block >= n {
                    return Err(ArmError::InvariantViolation(format!(
                        "stack {} holds unknown block {}",
                        index, block
                    )));
                }
                if seen[block] {
                    return Err(ArmError::InvariantViolation(format!(
                        "block {} appears more than once",
                        block
                    )));
                }
                seen[block] = true;
                if self.positions[block] != index {
                    return Err(ArmError::InvariantViolation(format!(
                        "block {} is in stack {} but indexed at {}",
                        block, index, self.positions[block]
                    )));
                }
            }
        }

        match seen.iter().position(|s| !s) {
            Some(missing) => Err(ArmError::InvariantViolation(format!(
                "block {} is missing",
                missing
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(src: &str) -> Operation {
        src.parse().unwrap()
    }

    fn stacks(table: &Table) -> Vec<Vec<Block>> {
        table.stacks().to_vec()
    }

    #[test]
    fn new_table_is_singletons() {
        let table = Table::new(4);
        assert_eq!(stacks(&table), vec![vec![0], vec![1], vec![2], vec![3]]);
        for b in 0..4 {
            assert_eq!(table.position_of(b), Some(b));
        }
        assert_eq!(table.position_of(4), None);
        table.check_invariant().unwrap();
    }

    #[test]
    fn move_over_sends_blocks_above_a_home() {
        let mut table = Table::new(5);
        table.pile_over(1, 0);
        table.pile_over(2, 0);
        // [0 1 2]
        table.move_over(1, 3);
        assert_eq!(table.stack(0), Some(&[0][..]));
        assert_eq!(table.stack(2), Some(&[2][..]));
        assert_eq!(table.stack(3), Some(&[3, 1][..]));
        table.check_invariant().unwrap();
    }

    #[test]
    fn move_onto_clears_destination() {
        let mut table = Table::new(5);
        table.move_over(4, 3);
        table.move_over(2, 3);
        // [3 4 2]
        table.move_onto(0, 3);
        assert_eq!(table.stack(3), Some(&[3, 0][..]));
        assert_eq!(table.stack(4), Some(&[4][..]));
        assert_eq!(table.stack(2), Some(&[2][..]));
        assert!(table.stack(0).unwrap().is_empty());
        table.check_invariant().unwrap();
    }

    #[test]
    fn pile_over_keeps_tower_order() {
        let mut table = Table::new(6);
        table.move_over(3, 1);
        table.move_over(5, 1);
        // [1 3 5]
        table.move_over(4, 0);
        table.pile_over(3, 0);
        assert_eq!(table.stack(0), Some(&[0, 4, 3, 5][..]));
        assert_eq!(table.stack(1), Some(&[1][..]));
        assert_eq!(table.position_of(5), Some(0));
        table.check_invariant().unwrap();
    }

    #[test]
    fn pile_onto_clears_then_piles() {
        let mut table = Table::new(6);
        table.move_over(2, 0);
        table.move_over(3, 1);
        table.move_over(4, 1);
        // [0 2] [1 3 4]
        table.pile_onto(1, 0);
        assert_eq!(table.stack(0), Some(&[0, 1, 3, 4][..]));
        assert_eq!(table.stack(2), Some(&[2][..]));
        assert!(table.stack(1).unwrap().is_empty());
        table.check_invariant().unwrap();
    }

    #[test]
    fn unstack_above_returns_blocks_home() {
        let mut table = Table::new(4);
        table.pile_over(1, 0);
        table.pile_over(2, 0);
        table.pile_over(3, 0);
        let moved = table.unstack_above(1);
        assert_eq!(moved, vec![2, 3]);
        assert_eq!(table.stack(0), Some(&[0, 1][..]));
        for b in moved {
            assert_eq!(table.stack(Table::home(b)), Some(&[b][..]));
            assert_eq!(table.position_of(b), Some(b));
        }
        assert!(table.unstack_above(1).is_empty());
    }

    #[test]
    fn same_stack_and_identical_blocks_are_no_ops() {
        let mut table = Table::new(4);
        table.apply(&op("pile 1 over 0")).unwrap();
        let before = table.clone();
        assert_eq!(table.apply(&op("move 2 onto 2")), Ok(false));
        assert_eq!(table.apply(&op("move 0 onto 1")), Ok(false));
        assert_eq!(table.apply(&op("pile 1 over 0")), Ok(false));
        assert_eq!(table, before);
    }

    #[test]
    fn apply_rejects_unknown_blocks() {
        let mut table = Table::new(3);
        assert_eq!(table.apply(&op("move 3 onto 0")), Err(ArmError::UnknownBlock(3)));
        assert_eq!(table.apply(&op("move 0 onto 7")), Err(ArmError::UnknownBlock(7)));
        assert_eq!(table, Table::new(3));
    }

    #[test]
    fn invariant_check_catches_corruption() {
        let mut table = Table::new(3);
        table.stacks[0].push(1);
        assert!(table.check_invariant().is_err());

        let mut table = Table::new(3);
        table.positions[2] = 0;
        assert!(table.check_invariant().is_err());

        let mut table = Table::new(3);
        table.stacks[1].clear();
        assert!(matches!(
            table.check_invariant(),
            Err(ArmError::InvariantViolation(msg)) if msg.contains("missing")
        ));
    }
}
