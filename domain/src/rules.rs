//! Board storage and the reference merge/fall rules.
//!
//! Row 0 is the top of the board and blocks stack downward from it. Only
//! groups touching a *fresh* block (placed, merged or moved during the current
//! move) merge, so a settled board never merges on its own.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};

use blockfall_types::{BlockId, BlockSnapshot, GlobalPhase, GridPos, GridSnapshot};

#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub(crate) id: BlockId,
    pub(crate) value: u32,
    pub(crate) target_value: Option<u32>,
    pub(crate) collapse_target: Option<GridPos>,
    pub(crate) move_target: Option<GridPos>,
    pub(crate) entering: bool,
    /// Stamp of the step that last touched this block; 0 means settled.
    pub(crate) fresh: u64,
}

impl Block {
    pub(crate) fn spawn(id: BlockId, value: u32, stamp: u64) -> Self {
        Self {
            id,
            value,
            target_value: None,
            collapse_target: None,
            move_target: None,
            entering: true,
            fresh: stamp,
        }
    }
}

/// One applied merge: the surviving cell, its new value, and how many blocks
/// it swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub at: GridPos,
    pub value: u32,
    pub absorbed: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Board {
    columns: usize,
    rows: usize,
    cells: Vec<Option<Block>>,
}

impl Board {
    pub(crate) fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![None; columns * rows],
        }
    }

    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    fn index(&self, pos: GridPos) -> usize {
        debug_assert!(pos.column < self.columns && pos.row < self.rows);
        pos.row * self.columns + pos.column
    }

    pub(crate) fn get(&self, pos: GridPos) -> Option<&Block> {
        self.cells[self.index(pos)].as_ref()
    }

    fn get_mut(&mut self, pos: GridPos) -> Option<&mut Block> {
        let index = self.index(pos);
        self.cells[index].as_mut()
    }

    fn take(&mut self, pos: GridPos) -> Option<Block> {
        let index = self.index(pos);
        self.cells[index].take()
    }

    pub(crate) fn put(&mut self, pos: GridPos, block: Block) {
        let index = self.index(pos);
        self.cells[index] = Some(block);
    }

    pub(crate) fn first_empty_row(&self, column: usize) -> Option<usize> {
        (0..self.rows).find(|&row| self.get(GridPos::new(column, row)).is_none())
    }

    /// Occupied cells in column-major order.
    fn positions(&self) -> Vec<GridPos> {
        (0..self.columns)
            .flat_map(|column| (0..self.rows).map(move |row| GridPos::new(column, row)))
            .filter(|&pos| self.get(pos).is_some())
            .collect()
    }

    fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.cells.iter_mut().flatten()
    }

    pub(crate) fn max_value(&self) -> Option<u32> {
        self.cells.iter().flatten().map(|block| block.value).max()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub(crate) fn clear_entering(&mut self) {
        for block in self.blocks_mut() {
            block.entering = false;
        }
    }

    pub(crate) fn clear_fresh(&mut self) {
        for block in self.blocks_mut() {
            block.fresh = 0;
        }
    }

    pub(crate) fn snapshot(&self, phase: GlobalPhase) -> GridSnapshot {
        let blocks = self
            .positions()
            .into_iter()
            .filter_map(|pos| {
                let block = self.get(pos)?;
                Some(BlockSnapshot {
                    id: block.id,
                    pos,
                    value: block.value,
                    target_value: block.target_value,
                    collapse_target: block.collapse_target,
                    move_target: block.move_target,
                    entering: block.entering,
                })
            })
            .collect();
        GridSnapshot {
            phase,
            columns: self.columns,
            rows: self.rows,
            blocks,
        }
    }

    /// 4-connected groups of two or more equal values that touch a fresh block.
    fn merge_groups(&self) -> Vec<Vec<GridPos>> {
        let mut visited = HashSet::new();
        let mut groups = Vec::new();

        for start in self.positions() {
            if !visited.insert(start) {
                continue;
            }
            let Some(value) = self.get(start).map(|block| block.value) else {
                continue;
            };

            let mut group = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(pos) = queue.pop_front() {
                for next in pos.neighbours(self.columns, self.rows) {
                    if visited.contains(&next) {
                        continue;
                    }
                    if self.get(next).is_some_and(|block| block.value == value) {
                        visited.insert(next);
                        group.push(next);
                        queue.push_back(next);
                    }
                }
            }

            let touches_fresh = group
                .iter()
                .any(|&pos| self.get(pos).is_some_and(|block| block.fresh > 0));
            if group.len() >= 2 && touches_fresh {
                groups.push(group);
            }
        }

        groups
    }

    /// Assign collapse targets for every merge group. Returns the group count.
    pub(crate) fn mark_collapses(&mut self) -> usize {
        let groups = self.merge_groups();
        for group in &groups {
            let Some(anchor) = group.iter().copied().max_by_key(|&pos| {
                let fresh = self.get(pos).map_or(0, |block| block.fresh);
                (fresh, pos.row, Reverse(pos.column))
            }) else {
                continue;
            };

            for &pos in group {
                if let Some(block) = self.get_mut(pos) {
                    block.collapse_target = Some(anchor);
                }
            }
            if let Some(block) = self.get_mut(anchor) {
                block.target_value = Some(block.value + (group.len() as u32 - 1));
            }
        }
        groups.len()
    }

    /// Remove absorbed blocks and promote anchors to their merged value.
    pub(crate) fn apply_collapses(&mut self, stamp: u64) -> Vec<Merge> {
        let mut absorbed: HashMap<GridPos, usize> = HashMap::new();

        for pos in self.positions() {
            let Some(target) = self.get(pos).and_then(|block| block.collapse_target) else {
                continue;
            };
            if target != pos {
                self.take(pos);
                *absorbed.entry(target).or_default() += 1;
            }
        }

        let mut merges = Vec::new();
        for pos in self.positions() {
            let Some(block) = self.get_mut(pos) else {
                continue;
            };
            if block.collapse_target.take().is_none() {
                continue;
            }
            block.value = block.target_value.take().unwrap_or(block.value);
            block.fresh = stamp;
            merges.push(Merge {
                at: pos,
                value: block.value,
                absorbed: absorbed.get(&pos).copied().unwrap_or_default(),
            });
        }
        merges
    }

    /// Assign move targets that compact every column toward row 0.
    /// Returns the number of blocks that have to move.
    pub(crate) fn mark_falls(&mut self) -> usize {
        let mut moving = 0;
        for column in 0..self.columns {
            let mut next = 0;
            for row in 0..self.rows {
                let pos = GridPos::new(column, row);
                let Some(block) = self.get_mut(pos) else {
                    continue;
                };
                if row != next {
                    block.move_target = Some(GridPos::new(column, next));
                    moving += 1;
                }
                next += 1;
            }
        }
        moving
    }

    pub(crate) fn apply_falls(&mut self, stamp: u64) {
        for column in 0..self.columns {
            let mut stacked = Vec::new();
            for row in 0..self.rows {
                if let Some(block) = self.take(GridPos::new(column, row)) {
                    stacked.push(block);
                }
            }
            for (row, mut block) in stacked.into_iter().enumerate() {
                if block.move_target.take().is_some() {
                    block.fresh = stamp;
                }
                self.put(GridPos::new(column, row), block);
            }
        }
    }
}
