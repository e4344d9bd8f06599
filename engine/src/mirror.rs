//! The entity mirror: one [`AnimatedEntity`] per live domain block.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::debug;

use blockfall_types::{BlockId, ContractViolation, GlobalPhase, GridPos, GridSnapshot};

use crate::entity::{AnimatedEntity, Completion};
use crate::layout::BoardLayout;

/// What a reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Every entity was recreated; `placements` of them started flying in.
    Rebuilt { placements: usize },
    /// Fields were overwritten in place; running motions continue.
    Updated,
}

#[derive(Debug, Default)]
pub struct MirrorStore {
    entities: HashMap<BlockId, AnimatedEntity>,
    last_phase: Option<GlobalPhase>,
    generation: u64,
}

impl MirrorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the mirror in line with `snapshot`.
    ///
    /// The first snapshot, and the first one after a change into PLACING or
    /// STATIC, rebuilds everything. Anything else updates fields in place.
    /// A snapshot that breaks the contract is refused before any mutation.
    pub fn reconcile(
        &mut self,
        snapshot: &GridSnapshot,
        layout: &BoardLayout,
        duration: Duration,
    ) -> Result<Reconciled, ContractViolation> {
        let rebuild = match self.last_phase {
            None => true,
            Some(last) => last != snapshot.phase && snapshot.phase.rebuilds_mirror(),
        };
        self.validate(snapshot, rebuild)?;
        self.last_phase = Some(snapshot.phase);

        if rebuild {
            let placements = self.rebuild(snapshot, layout, duration);
            return Ok(Reconciled::Rebuilt { placements });
        }

        snapshot.iterate_blocks(|_, _, block| {
            if let Some(entity) = self.entities.get_mut(&block.id) {
                entity.apply(block);
            }
        });
        debug!(phase = %snapshot.phase, blocks = snapshot.blocks.len(), "Updated mirror in place");
        Ok(Reconciled::Updated)
    }

    fn rebuild(
        &mut self,
        snapshot: &GridSnapshot,
        layout: &BoardLayout,
        duration: Duration,
    ) -> usize {
        self.entities.clear();
        self.generation += 1;
        let mut placements = 0;
        snapshot.iterate_blocks(|_, _, block| {
            let mut entity = AnimatedEntity::spawn(block, snapshot.phase, layout);
            if entity.start_placement(layout, duration) {
                placements += 1;
            }
            self.entities.insert(block.id, entity);
        });
        debug!(
            phase = %snapshot.phase,
            generation = self.generation,
            entities = self.entities.len(),
            placements,
            "Rebuilt mirror"
        );
        placements
    }

    fn validate(&self, snapshot: &GridSnapshot, rebuild: bool) -> Result<(), ContractViolation> {
        let phase = snapshot.phase;
        let mut seen = HashSet::with_capacity(snapshot.blocks.len());
        let in_bounds = |id: BlockId, target: GridPos| {
            if snapshot.contains(target) {
                Ok(())
            } else {
                Err(ContractViolation::TargetOutOfBounds {
                    id,
                    target,
                    columns: snapshot.columns,
                    rows: snapshot.rows,
                })
            }
        };

        snapshot.try_iterate_blocks(|_, _, block| {
            let id = block.id;
            if !seen.insert(id) {
                return Err(ContractViolation::DuplicateIdentity { id, phase });
            }
            if block.entering && phase != GlobalPhase::Placing {
                return Err(ContractViolation::EnteringOutsidePlacing { id, phase });
            }
            if !rebuild && !self.entities.contains_key(&id) {
                return Err(ContractViolation::UnknownEntity { id, phase });
            }
            if let Some(target) = block.move_target {
                in_bounds(id, target)?;
            }
            if let Some(target) = block.collapse_target {
                in_bounds(id, target)?;
                if snapshot.block_at(target).is_none() {
                    return Err(ContractViolation::CollapseTargetVacant { id, target });
                }
            }
            Ok(())
        })
    }

    /// Start the collapse motion on every entity with a collapse target.
    /// Returns how many started.
    pub fn collapse_all(&mut self, layout: &BoardLayout, duration: Duration) -> usize {
        self.entities
            .values_mut()
            .map(|entity| entity.collapse(layout, duration))
            .filter(|started| *started)
            .count()
    }

    /// Start the move motion on every entity with a move target.
    /// Returns how many started.
    pub fn move_all(&mut self, layout: &BoardLayout, duration: Duration) -> usize {
        self.entities
            .values_mut()
            .map(|entity| entity.move_to_target(layout, duration))
            .filter(|started| *started)
            .count()
    }

    /// Advance every motion by `delta`. Absorbed entities are dropped as
    /// their collapse completes.
    pub fn advance(&mut self, delta: Duration) -> Vec<Completion> {
        let mut completions: Vec<Completion> = self
            .entities
            .values_mut()
            .filter_map(|entity| entity.advance(delta))
            .collect();
        completions.sort_by_key(|completion| completion.id);

        for completion in completions.iter().filter(|completion| completion.absorbed) {
            self.entities.remove(&completion.id);
            debug!(id = %completion.id, "Removed absorbed entity");
        }
        completions
    }

    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&AnimatedEntity> {
        self.entities.get(&id)
    }

    /// The entity whose mirrored cell is `pos`.
    #[must_use]
    pub fn at(&self, pos: GridPos) -> Option<&AnimatedEntity> {
        self.entities.values().find(|entity| entity.pos() == pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities ordered by identity.
    #[must_use]
    pub fn iter(&self) -> Vec<&AnimatedEntity> {
        let mut entities: Vec<&AnimatedEntity> = self.entities.values().collect();
        entities.sort_by_key(|entity| entity.id());
        entities
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.entities.values().any(AnimatedEntity::is_animating)
    }

    /// Bumped on every full rebuild.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
