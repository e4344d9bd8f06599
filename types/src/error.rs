use thiserror::Error;

use crate::{BlockId, GlobalPhase, GridPos};

/// A snapshot the animation core cannot mirror faithfully.
///
/// These are bugs in whatever produced the snapshot. The core refuses the
/// snapshot as a whole and the run is expected to stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("block {id} appears more than once in the {phase} snapshot")]
    DuplicateIdentity { id: BlockId, phase: GlobalPhase },

    #[error("block {id} is not mirrored, but the {phase} snapshot updates it in place")]
    UnknownEntity { id: BlockId, phase: GlobalPhase },

    #[error("block {id} targets {target}, outside the {columns}x{rows} board")]
    TargetOutOfBounds {
        id: BlockId,
        target: GridPos,
        columns: usize,
        rows: usize,
    },

    #[error("block {id} collapses into {target}, but no block occupies that cell")]
    CollapseTargetVacant { id: BlockId, target: GridPos },

    #[error("block {id} is marked entering during {phase}")]
    EnteringOutsidePlacing { id: BlockId, phase: GlobalPhase },
}

impl ContractViolation {
    #[must_use]
    pub fn block(&self) -> BlockId {
        match self {
            Self::DuplicateIdentity { id, .. }
            | Self::UnknownEntity { id, .. }
            | Self::TargetOutOfBounds { id, .. }
            | Self::CollapseTargetVacant { id, .. }
            | Self::EnteringOutsidePlacing { id, .. } => *id,
        }
    }
}
