//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed substep order within every tick
//! - Seeded RNG only (visual effects included)
//! - No rendering or platform dependencies
//!
//! The host drives it with one [`tick`] call per rendered frame and a fresh
//! [`TickInput`] latched beforehand.

pub mod animation;
pub mod geometry;
pub mod modes;
pub mod particles;
pub mod player;
pub mod stage;
pub mod state;
pub mod tick;
pub mod tiles;

pub use animation::{AnimationError, InterpolatedColor, InterpolatedVariable, VariableAnimation};
pub use geometry::{InvalidGeometry, Rect, Rotation};
pub use modes::GameMode;
pub use particles::{Particle, Particles};
pub use player::Player;
pub use stage::{ColorSection, KeyColor, KeyTally, Stage};
pub use state::{CompletionReport, GameState};
pub use tick::{TickInput, substep_count, tick};
pub use tiles::{OrbEffect, PadEffect, Tile, TileKind};
