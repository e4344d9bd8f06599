//! Core domain types for Blockfall.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Both the domain model (which produces snapshots) and the animation engine
//! (which mirrors them) depend on it.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod animation;
mod error;
mod geometry;
mod grid;
mod ids;

pub use animation::EffectTimer;
pub use error::ContractViolation;
pub use geometry::Point;
pub use grid::{BlockSnapshot, GlobalPhase, GridPos, GridSnapshot, PhaseKind};
pub use ids::{BlockId, BlockIdAllocator};
