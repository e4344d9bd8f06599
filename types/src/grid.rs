//! Grid snapshot types emitted by the domain model.
//!
//! A [`GridSnapshot`] is read-only to the animation core. The domain model is
//! the sole writer of grid truth; the core only mirrors it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BlockId;

/// A logical cell. Row 0 is the top edge of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub column: usize,
    pub row: usize,
}

impl GridPos {
    #[must_use]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// 4-connected neighbours that fall inside a `columns x rows` board.
    pub fn neighbours(self, columns: usize, rows: usize) -> impl Iterator<Item = GridPos> {
        let GridPos { column, row } = self;
        [
            column.checked_sub(1).map(|c| GridPos::new(c, row)),
            (column + 1 < columns).then(|| GridPos::new(column + 1, row)),
            row.checked_sub(1).map(|r| GridPos::new(column, r)),
            (row + 1 < rows).then(|| GridPos::new(column, row + 1)),
        ]
        .into_iter()
        .flatten()
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// The global stage of resolving one player move.
///
/// The domain asserts which phase is entered; the animation core decides when
/// the animated phases (placing, collapsing, moving) are finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalPhase {
    Placing,
    #[default]
    Static,
    Collapsing,
    Moving,
}

impl GlobalPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placing => "PLACING",
            Self::Static => "STATIC",
            Self::Collapsing => "COLLAPSING",
            Self::Moving => "MOVING",
        }
    }

    /// Phases whose entry discards and recreates every visual entity.
    #[must_use]
    pub const fn rebuilds_mirror(self) -> bool {
        matches!(self, Self::Placing | Self::Static)
    }

    /// The completion channel that ends this phase, if the phase animates.
    #[must_use]
    pub const fn completion_kind(self) -> Option<PhaseKind> {
        match self {
            Self::Placing => Some(PhaseKind::Placement),
            Self::Collapsing => Some(PhaseKind::Collapse),
            Self::Moving => Some(PhaseKind::Move),
            Self::Static => None,
        }
    }
}

impl fmt::Display for GlobalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One kind of animated phase, and the completion channel it reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Placement,
    Collapse,
    Move,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 3] = [Self::Placement, Self::Collapse, Self::Move];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Placement => 0,
            Self::Collapse => 1,
            Self::Move => 2,
        }
    }

    /// The global phase this kind animates.
    #[must_use]
    pub const fn phase(self) -> GlobalPhase {
        match self {
            Self::Placement => GlobalPhase::Placing,
            Self::Collapse => GlobalPhase::Collapsing,
            Self::Move => GlobalPhase::Moving,
        }
    }

    /// The phase requested once every motion of this kind has finished.
    #[must_use]
    pub const fn next_phase(self) -> GlobalPhase {
        match self {
            Self::Placement => GlobalPhase::Collapsing,
            Self::Collapse => GlobalPhase::Moving,
            Self::Move => GlobalPhase::Static,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placement => "placement",
            Self::Collapse => "collapse",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occupied cell as the domain sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub pos: GridPos,
    pub value: u32,
    /// Post-merge value, present on the surviving member of a merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_target: Option<GridPos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_target: Option<GridPos>,
    /// Freshly spawned block flying in during PLACING.
    #[serde(default)]
    pub entering: bool,
}

impl BlockSnapshot {
    #[must_use]
    pub fn new(id: BlockId, pos: GridPos, value: u32) -> Self {
        Self {
            id,
            pos,
            value,
            target_value: None,
            collapse_target: None,
            move_target: None,
            entering: false,
        }
    }

    #[must_use]
    pub fn entering(mut self) -> Self {
        self.entering = true;
        self
    }

    #[must_use]
    pub fn collapsing_into(mut self, target: GridPos) -> Self {
        self.collapse_target = Some(target);
        self
    }

    #[must_use]
    pub fn merging_to(mut self, target_value: u32) -> Self {
        self.target_value = Some(target_value);
        self
    }

    #[must_use]
    pub fn moving_to(mut self, target: GridPos) -> Self {
        self.move_target = Some(target);
        self
    }
}

/// Full domain state pushed to the animation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub phase: GlobalPhase,
    pub columns: usize,
    pub rows: usize,
    pub blocks: Vec<BlockSnapshot>,
}

impl GridSnapshot {
    #[must_use]
    pub fn empty(columns: usize, rows: usize) -> Self {
        Self {
            phase: GlobalPhase::Static,
            columns,
            rows,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.column < self.columns && pos.row < self.rows
    }

    #[must_use]
    pub fn block_at(&self, pos: GridPos) -> Option<&BlockSnapshot> {
        self.blocks.iter().find(|block| block.pos == pos)
    }

    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&BlockSnapshot> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Visit every occupied cell with its block, column and row.
    pub fn iterate_blocks(&self, mut visit: impl FnMut(usize, usize, &BlockSnapshot)) {
        for block in &self.blocks {
            visit(block.pos.column, block.pos.row, block);
        }
    }

    /// Like [`Self::iterate_blocks`], stopping at the first error.
    pub fn try_iterate_blocks<E>(
        &self,
        mut visit: impl FnMut(usize, usize, &BlockSnapshot) -> Result<(), E>,
    ) -> Result<(), E> {
        for block in &self.blocks {
            visit(block.pos.column, block.pos.row, block)?;
        }
        Ok(())
    }
}
