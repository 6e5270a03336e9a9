//! The player entity: position, velocity, gravity sign, current mode
//!
//! The mode is an owned value (`GameMode` is `Copy`); portals swap it by
//! replacement, so no stale handle can keep acting on an old mode.

use crate::consts::*;
use crate::sim::geometry::Rect;
use crate::sim::modes::GameMode;
use crate::sim::tick::TickInput;
use crate::sim::tiles::{OrbEffect, Tile, TileKind};

/// A deferred effect armed by an orb, consumed on the next activation edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialAction {
    /// Index of the arming orb, so consumption can start its cooldown
    pub tile: usize,
    pub effect: OrbEffect,
}

/// The player's contact bands against block-style tiles.
///
/// `side` is the middle slab that kills (or pushes, in platformer levels);
/// `ceiling` and `ground` are the 30% proximity bands on the gravity-up and
/// gravity-down edges respectively.
#[derive(Debug, Clone, Copy)]
pub struct BlockBands {
    pub side: Rect,
    pub ceiling: Rect,
    pub ground: Rect,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    /// Vertical velocity, tiles per tick
    pub vy: f32,
    /// +1.0 or -1.0
    pub gravity: f32,
    /// Display rotation, degrees
    pub rotation: f32,
    pub mode: GameMode,
    /// Contact height written by tile reactions this substep, consumed by
    /// the same substep's post-tick
    pub ground_height: Option<f32>,
    pub special: Option<SpecialAction>,
    /// Cleared by hazards; the state reaps dead players at the substep edge
    pub alive: bool,
}

impl Player {
    /// Spawn at the level's start marker, or the default run-up position
    pub fn spawn(tiles: &[Tile], mode: GameMode, platformer: bool) -> Self {
        let (x, y) = tiles
            .iter()
            .find(|t| matches!(t.kind, TileKind::StartPos))
            .map(|t| (t.x, t.y))
            .unwrap_or_else(|| {
                if platformer {
                    (0.0, 0.0)
                } else {
                    (DEFAULT_START_X, 0.0)
                }
            });
        Self {
            x,
            y,
            vy: 0.0,
            gravity: 1.0,
            rotation: 0.0,
            mode,
            ground_height: None,
            special: None,
            alive: true,
        }
    }

    /// The mode-specific hitbox at the current position
    pub fn hitbox(&self) -> Rect {
        self.mode.hitbox(self.x, self.y)
    }

    /// Inset hitbox used against hazards only
    pub fn death_hitbox(&self) -> Rect {
        self.hitbox().relative(
            DEATH_HITBOX_INSET,
            DEATH_HITBOX_INSET,
            1.0 - 2.0 * DEATH_HITBOX_INSET,
            1.0 - 2.0 * DEATH_HITBOX_INSET,
        )
    }

    /// Contact bands for block collision, oriented by the gravity sign
    pub fn block_bands(&self) -> BlockBands {
        let margin = BLOCK_EDGE_MARGIN;
        let general = self.hitbox();
        let upper = general.relative(0.0, 1.0 - margin, 1.0, margin);
        let lower = general.relative(0.0, 0.0, 1.0, margin);
        let (ceiling, ground) = if self.gravity > 0.0 {
            (upper, lower)
        } else {
            (lower, upper)
        };
        BlockBands {
            side: general.relative(0.0, margin, 1.0, 1.0 - margin * 2.0),
            ceiling,
            ground,
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Whether a ceiling hit is lethal right now. Platformer levels disable
    /// ceiling death globally, regardless of mode.
    pub fn dies_from_ceiling(&self, platformer: bool) -> bool {
        !platformer && self.mode.dies_from_ceiling()
    }

    /// Movement half of the per-substep protocol: horizontal advance, mode
    /// gravity, vertical update, contact-state reset, floor clamp and the
    /// above-stage kill. Runs before any tile reacts.
    pub fn pre_tick(
        &mut self,
        dt: f32,
        input: &TickInput,
        platformer: bool,
        stage_height: f32,
    ) {
        if platformer {
            if input.pressing_left {
                self.x -= SCROLL_SPEED * dt;
            }
            if input.pressing_right {
                self.x += SCROLL_SPEED * dt;
            }
            if self.x < 0.0 {
                self.x = 0.0;
            }
        } else {
            self.x += SCROLL_SPEED * dt;
        }

        let mode = self.mode;
        mode.integrate_gravity(self, dt, input);
        self.y += self.vy * dt;

        self.ground_height = None;
        self.special = None;

        if self.y < 0.0 {
            self.y = 0.0;
            if self.gravity > 0.0 {
                self.ground_height = Some(0.0);
            }
        }
        if self.y > stage_height {
            self.kill();
        }
    }

    /// Zero out vertical velocity into a contact surface. Runs at the top of
    /// the post-tick, after tiles have had their say on `ground_height`.
    pub fn settle_on_ground(&mut self) {
        if self.ground_height.is_some() {
            if self.gravity < 0.0 {
                if self.vy > 0.0 {
                    self.vy = 0.0;
                }
            } else if self.vy < 0.0 {
                self.vy = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_player() -> Player {
        Player::spawn(&[], GameMode::Cube, false)
    }

    #[test]
    fn test_default_spawn_position() {
        let p = cube_player();
        assert_relative_eq!(p.x, -3.0);
        assert_relative_eq!(p.y, 0.0);
        let p = Player::spawn(&[], GameMode::Cube, true);
        assert_relative_eq!(p.x, 0.0);
    }

    #[test]
    fn test_spawn_at_start_marker() {
        let tiles = vec![
            Tile::new(TileKind::Block { half: false }, 1.0, 0.0),
            Tile::new(TileKind::StartPos, 12.0, 3.0),
        ];
        let p = Player::spawn(&tiles, GameMode::Ship, false);
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 3.0);
        assert_eq!(p.mode, GameMode::Ship);
    }

    #[test]
    fn test_death_hitbox_is_inset() {
        let p = cube_player();
        let death = p.death_hitbox();
        assert_relative_eq!(death.x, p.x + 0.1);
        assert_relative_eq!(death.w, 0.8);
    }

    #[test]
    fn test_block_bands_follow_gravity() {
        let mut p = cube_player();
        let bands = p.block_bands();
        assert_relative_eq!(bands.ground.y, p.y);
        assert_relative_eq!(bands.ceiling.y, p.y + 0.7);
        assert_relative_eq!(bands.side.y, p.y + 0.3);
        assert_relative_eq!(bands.side.h, 0.4);

        p.gravity = -1.0;
        let bands = p.block_bands();
        assert_relative_eq!(bands.ground.y, p.y + 0.7);
        assert_relative_eq!(bands.ceiling.y, p.y);
    }

    #[test]
    fn test_floor_clamp_sets_ground_only_with_downward_gravity() {
        let mut p = cube_player();
        p.y = -2.0;
        p.pre_tick(1.0, &TickInput::default(), false, 100.0);
        assert_relative_eq!(p.y, 0.0);
        assert_eq!(p.ground_height, Some(0.0));

        let mut p = cube_player();
        p.gravity = -1.0;
        p.y = -2.0;
        p.pre_tick(1.0, &TickInput::default(), false, 100.0);
        assert_relative_eq!(p.y, 0.0);
        assert_eq!(p.ground_height, None);
    }

    #[test]
    fn test_flying_above_stage_kills() {
        let mut p = cube_player();
        p.gravity = -1.0;
        p.y = 49.9;
        p.vy = 0.5;
        p.pre_tick(1.0, &TickInput::default(), false, 50.0);
        assert!(!p.alive);
    }

    #[test]
    fn test_settle_on_ground_zeroes_velocity_into_surface() {
        let mut p = cube_player();
        p.ground_height = Some(1.0);
        p.vy = -0.4;
        p.settle_on_ground();
        assert_relative_eq!(p.vy, 0.0);

        // Moving away from the surface is left alone.
        p.vy = 0.2;
        p.settle_on_ground();
        assert_relative_eq!(p.vy, 0.2);
    }
}
