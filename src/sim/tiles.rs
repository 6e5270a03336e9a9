//! Tile variants: blocks, hazards, orbs, pads, portals, triggers, pickups
//!
//! Every variant answers the same contract: a hitbox, a reaction to the
//! player's current rectangles, and a per-substep tick for its own state
//! (cooldowns, queued translations, collection fades). Reactions that touch
//! *other* tiles (move triggers) are deferred as [`TileCommand`]s and applied
//! by the loop within the same substep.

use glam::Vec2;
use log::warn;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::sim::animation::{Axis, AxisAnimation, VariableAnimation};
use crate::sim::geometry::{Rect, Rotation};
use crate::sim::modes::GameMode;
use crate::sim::particles::Particles;
use crate::sim::player::{Player, SpecialAction};
use crate::sim::stage::{ColorSection, KeyColor, Stage};

/// What an orb does when its armed action is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbEffect {
    Jump,
    Black,
    Gravity,
}

impl OrbEffect {
    pub fn apply(self, player: &mut Player) {
        match self {
            OrbEffect::Jump => player.vy = ORB_JUMP_VY * player.gravity,
            OrbEffect::Black => player.vy += -BLACK_ORB_KICK * player.gravity,
            OrbEffect::Gravity => {
                player.gravity = -player.gravity;
                player.vy = player.gravity * -GRAVITY_FLIP_VY;
            }
        }
    }

    pub fn particle_color(self) -> &'static str {
        match self {
            OrbEffect::Jump => "yellow",
            OrbEffect::Black => "black",
            OrbEffect::Gravity => "cyan",
        }
    }
}

/// What a pad does the moment the player touches it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEffect {
    Jump,
    SmallJump,
    Gravity,
}

impl PadEffect {
    pub fn apply(self, player: &mut Player, rotation: Rotation) {
        match self {
            PadEffect::Jump => player.vy = ORB_JUMP_VY * player.gravity,
            PadEffect::SmallJump => player.vy = PAD_SMALL_JUMP_VY * player.gravity,
            PadEffect::Gravity => {
                // Floor pads force upward gravity, ceiling pads downward,
                // side-mounted pads just flip.
                player.gravity = match rotation {
                    Rotation::R0 => -1.0,
                    Rotation::R180 => 1.0,
                    _ => -player.gravity,
                };
                player.vy = player.gravity * -GRAVITY_FLIP_VY;
            }
        }
    }

    pub fn particle_color(self) -> &'static str {
        match self {
            PadEffect::Jump => "yellow",
            PadEffect::SmallJump => "#F0F",
            PadEffect::Gravity => "#0FF",
        }
    }
}

/// The closed set of tile behaviors
#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    /// Solid block; `half` keeps only the bottom half of the cell
    Block { half: bool },
    /// Spike hazard; `half` is the short variant
    Spike { half: bool },
    Orb { effect: OrbEffect, cooldown: f32 },
    Pad { effect: PadEffect, cooldown: f32 },
    /// Sets the gravity sign to `gravity` unconditionally
    GravityPortal { gravity: f32 },
    /// Replaces the player's mode by value
    ModePortal { mode: GameMode },
    ColorTrigger {
        needs_touch: bool,
        activated: bool,
        section: ColorSection,
        color: [f32; 3],
        duration: f32,
    },
    MoveTrigger {
        needs_touch: bool,
        activated: bool,
        target_group: String,
        x_amount: f32,
        y_amount: f32,
        duration: f32,
    },
    /// `progress` runs 1..=COIN_FADE_TICKS once collected; `already_got`
    /// marks collection carried over from an earlier attempt or session
    Coin { progress: f32, already_got: bool },
    /// `progress` runs 1..=KEY_FADE_TICKS once collected; `vel` is the
    /// pickup drift
    Key {
        color: KeyColor,
        progress: f32,
        vel: Vec2,
    },
    /// Spawn marker, inert during play
    StartPos,
}

/// Cross-tile effect deferred out of a tile reaction, applied by the loop
/// in the same substep
#[derive(Debug, Clone, PartialEq)]
pub enum TileCommand {
    MoveGroup {
        group: String,
        x_amount: f32,
        y_amount: f32,
        duration: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub x: f32,
    pub y: f32,
    pub display_w: f32,
    pub display_h: f32,
    pub rotation: Rotation,
    pub groups: Vec<String>,
    pub kind: TileKind,
    pub animations: Vec<AxisAnimation>,
}

impl Tile {
    pub fn new(kind: TileKind, x: f32, y: f32) -> Self {
        let (display_w, display_h) = match &kind {
            TileKind::Orb { .. } => (0.5, 0.5),
            TileKind::GravityPortal { .. } => (1.0, 2.57),
            TileKind::ModePortal { .. } => (1.4545, 3.2),
            TileKind::Key { .. } => (1.0, 0.75),
            _ => (1.0, 1.0),
        };
        Self {
            x,
            y,
            display_w,
            display_h,
            rotation: Rotation::R0,
            groups: Vec::new(),
            kind,
            animations: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// The unrotated unit cell this tile occupies
    pub fn cell(&self) -> Rect {
        Rect::new(self.x, self.y, 1.0, 1.0)
    }

    /// Center of the cell, the pivot for every rotation
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + 0.5, self.y + 0.5)
    }

    /// The rectangle this tile collides with. Triggers, coins, keys and
    /// start markers ignore rotation; everything else rotates its shape
    /// about the cell center.
    pub fn hitbox(&self) -> Rect {
        let cell = self.cell();
        let rotated = |shape: Rect| shape.rotate_about(self.rotation, self.center());
        match &self.kind {
            TileKind::Block { half: false } => rotated(cell),
            TileKind::Block { half: true } => rotated(cell.relative(0.0, 0.0, 1.0, 0.5)),
            TileKind::Spike { half: false } => rotated(cell.relative(0.2, 0.0, 0.6, 0.8)),
            TileKind::Spike { half: true } => rotated(cell.relative(0.2, 0.0, 0.6, 0.4)),
            TileKind::Orb { .. } => rotated(Rect::new(
                self.x - ORB_PADDING,
                self.y - ORB_PADDING,
                1.0 + 2.0 * ORB_PADDING,
                1.0 + 2.0 * ORB_PADDING,
            )),
            TileKind::Pad { .. } => rotated(cell.relative(0.0, 0.0, 1.0, 0.2)),
            TileKind::GravityPortal { .. } | TileKind::ModePortal { .. } => rotated(Rect::new(
                self.x,
                self.y - (PORTAL_HITBOX_HEIGHT - 1.0) / 2.0,
                1.0,
                PORTAL_HITBOX_HEIGHT,
            )),
            TileKind::ColorTrigger { .. }
            | TileKind::MoveTrigger { .. }
            | TileKind::Coin { .. }
            | TileKind::Key { .. }
            | TileKind::StartPos => cell,
        }
    }

    /// Per-substep bookkeeping: drain queued translations, decay cooldowns,
    /// advance collection fades, shed ambient particles.
    pub fn tick(&mut self, dt: f32, rng: &mut Pcg32, particles: &mut Particles) {
        let mut animations = std::mem::take(&mut self.animations);
        animations.retain_mut(|a| {
            let (delta, done) = a.animation.tick(dt);
            match a.axis {
                Axis::X => self.x += delta,
                Axis::Y => self.y += delta,
            }
            !done
        });
        self.animations = animations;

        self.shed_ambient(dt, rng, particles);

        let Tile { x, y, kind, .. } = self;
        match kind {
            TileKind::Orb { cooldown, .. } | TileKind::Pad { cooldown, .. } => {
                if *cooldown > 0.0 {
                    *cooldown -= dt;
                }
            }
            TileKind::Coin { progress, .. } => {
                if *progress > 0.0 && *progress < COIN_FADE_TICKS {
                    *progress += dt;
                }
            }
            TileKind::Key { progress, vel, .. } => {
                if *progress > 0.0 && *progress < KEY_FADE_TICKS {
                    *x += vel.x * dt;
                    *y += vel.y * dt;
                    vel.y -= 0.02 * dt;
                    *progress += dt;
                }
            }
            _ => {}
        }
    }

    /// Ambient sparkle on orbs, pads and portals: one particle per tick on
    /// average, spread across substeps
    fn shed_ambient(&self, dt: f32, rng: &mut Pcg32, particles: &mut Particles) {
        match &self.kind {
            TileKind::Orb { effect, .. } => {
                if rng.random::<f32>() < dt {
                    particles.spawn_orb_ambient(rng, self.x, self.y, effect.particle_color());
                }
            }
            TileKind::Pad { effect, .. } => {
                if rng.random::<f32>() < dt {
                    let acc = match self.rotation {
                        Rotation::R0 => Vec2::new(0.0, 1.0),
                        Rotation::R90 => Vec2::new(1.0, 0.0),
                        Rotation::R180 => Vec2::new(0.0, -1.0),
                        Rotation::R270 => Vec2::new(-1.0, 1.0),
                    };
                    particles.spawn_pad_spark(rng, self.hitbox(), acc, effect.particle_color());
                }
            }
            TileKind::GravityPortal { .. } | TileKind::ModePortal { .. } => {
                if rng.random::<f32>() < dt {
                    particles.spawn_portal_ambient(
                        rng,
                        self.x,
                        self.y,
                        self.portal_color(),
                        self.rotation.degrees() - 90.0,
                    );
                }
            }
            _ => {}
        }
    }

    fn portal_color(&self) -> &'static str {
        match &self.kind {
            TileKind::GravityPortal { gravity } if *gravity > 0.0 => "#94ffff",
            TileKind::GravityPortal { .. } => "#fff9bd",
            TileKind::ModePortal { mode: GameMode::Cube } => "#80ff9d",
            TileKind::ModePortal { mode: GameMode::Ship } => "#ff94bd",
            TileKind::ModePortal { mode: GameMode::Ball } => "#ff692b",
            TileKind::ModePortal { mode: GameMode::Wave } => "#00bcff",
            _ => "blue",
        }
    }

    /// Start the post-activation cooldown on an orb whose special action
    /// just fired; returns its flash color.
    pub fn start_orb_cooldown(&mut self) -> Option<&'static str> {
        if let TileKind::Orb { cooldown, effect } = &mut self.kind {
            *cooldown = ACTIVATION_COOLDOWN_TICKS;
            Some(effect.particle_color())
        } else {
            None
        }
    }

    /// React to the player's current rectangles. `index` is this tile's slot
    /// in the tile list, recorded when arming a special action.
    pub fn react(
        &mut self,
        index: usize,
        player: &mut Player,
        stage: &mut Stage,
        commands: &mut Vec<TileCommand>,
        particles: &mut Particles,
        rng: &mut Pcg32,
        platformer: bool,
    ) {
        let hitbox = match self.hitbox().require_finite() {
            Ok(rect) => rect,
            Err(_) => {
                warn!(
                    "tile at ({}, {}) produced a non-finite hitbox; skipping interaction",
                    self.x, self.y
                );
                return;
            }
        };
        let cell = self.cell();
        let (tile_x, tile_y) = (self.x, self.y);
        let rotation = self.rotation;
        let portal_color = self.portal_color();

        match &mut self.kind {
            TileKind::Block { .. } => block_react(hitbox, player, platformer),

            TileKind::Spike { .. } => {
                if player.death_hitbox().overlaps(&hitbox) {
                    player.kill();
                }
            }

            TileKind::Orb { effect, cooldown } => {
                if *cooldown > 0.0 {
                    return;
                }
                if player.hitbox().overlaps(&hitbox) {
                    player.special = Some(SpecialAction {
                        tile: index,
                        effect: *effect,
                    });
                }
            }

            TileKind::Pad { effect, cooldown } => {
                if *cooldown > 0.0 {
                    return;
                }
                if player.hitbox().overlaps(&hitbox) {
                    effect.apply(player, rotation);
                    *cooldown = ACTIVATION_COOLDOWN_TICKS;
                    particles.spawn_flash(
                        hitbox.center_x() - 0.5,
                        hitbox.center_y() - 0.5,
                        effect.particle_color(),
                        0.1,
                        1.1,
                        1.0,
                    );
                }
            }

            TileKind::GravityPortal { gravity } => {
                if player.hitbox().overlaps(&hitbox) {
                    // The transition flash is gated on an actual change; the
                    // sign itself is set unconditionally.
                    if player.gravity != *gravity {
                        particles.spawn_flash(tile_x, tile_y, portal_color, 1.5, 0.0, -0.4);
                    }
                    player.gravity = *gravity;
                }
            }

            TileKind::ModePortal { mode } => {
                if player.hitbox().overlaps(&hitbox) {
                    if player.mode != *mode {
                        particles.spawn_flash(tile_x, tile_y, portal_color, 1.5, 0.0, -0.4);
                    }
                    player.mode = *mode;
                }
            }

            TileKind::ColorTrigger {
                needs_touch,
                activated,
                section,
                color,
                duration,
            } => {
                if *activated {
                    return;
                }
                if trigger_hit(*needs_touch, player, &cell) {
                    *activated = true;
                    stage.color_mut(*section).interpolate(*color, *duration);
                }
            }

            TileKind::MoveTrigger {
                needs_touch,
                activated,
                target_group,
                x_amount,
                y_amount,
                duration,
            } => {
                if *activated {
                    return;
                }
                if trigger_hit(*needs_touch, player, &cell) {
                    *activated = true;
                    commands.push(TileCommand::MoveGroup {
                        group: target_group.clone(),
                        x_amount: *x_amount,
                        y_amount: *y_amount,
                        duration: *duration,
                    });
                }
            }

            TileKind::Coin { progress, .. } => {
                if *progress > 0.0 {
                    return;
                }
                if player.hitbox().overlaps(&cell) {
                    *progress = 1.0;
                }
            }

            TileKind::Key {
                color,
                progress,
                vel,
            } => {
                if *progress > 0.0 {
                    return;
                }
                if player.hitbox().overlaps(&cell) {
                    *progress = 1.0;
                    *vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.15, 0.2);
                    stage.keys.collect(*color);
                }
            }

            TileKind::StartPos => {}
        }
    }

    /// Whether this coin counts as collected for completion reporting
    pub fn coin_collected(&self) -> Option<bool> {
        match &self.kind {
            TileKind::Coin {
                progress,
                already_got,
            } => Some(*progress > 0.0 || *already_got),
            _ => None,
        }
    }
}

/// Checkpoint-style triggers fire on a horizontal center crossing; touch
/// triggers on hitbox overlap with the (unrotated) tile cell.
fn trigger_hit(needs_touch: bool, player: &Player, cell: &Rect) -> bool {
    if needs_touch {
        player.hitbox().overlaps(cell)
    } else {
        player.hitbox().center_x() > cell.center_x()
    }
}

/// Block collision: the side slab kills (or shoves, in platformer levels),
/// the gravity-up band snaps or defers to a lethal side hit, the
/// gravity-down band publishes the ground contact height.
fn block_react(block: Rect, player: &mut Player, platformer: bool) {
    let bands = player.block_bands();
    if bands.side.overlaps(&block) {
        if !platformer {
            player.kill();
        } else if bands.side.center_x() < block.center_x() {
            player.x = block.x - bands.side.w;
        } else {
            player.x = block.x + block.w;
        }
    } else if bands.ceiling.overlaps(&block) {
        if player.dies_from_ceiling(platformer) {
            // The side slab reaches the block within a substep or two and
            // handles the kill; nothing to do yet.
        } else {
            if player.gravity > 0.0 {
                player.y = block.y - player.hitbox().h;
            } else {
                let wave_gap = if player.mode == GameMode::Wave { 0.1 } else { 0.0 };
                player.y = block.y + block.h - wave_gap;
            }
            player.vy = 0.0;
        }
    } else if bands.ground.overlaps(&block) {
        player.ground_height = Some(if player.gravity > 0.0 {
            block.y + block.h
        } else {
            block.y
        });
    }
}

/// Apply deferred cross-tile effects within the same substep they fired
pub fn apply_commands(tiles: &mut [Tile], commands: Vec<TileCommand>) {
    for command in commands {
        match command {
            TileCommand::MoveGroup {
                group,
                x_amount,
                y_amount,
                duration,
            } => {
                for tile in tiles
                    .iter_mut()
                    .filter(|t| t.groups.iter().any(|g| *g == group))
                {
                    if duration <= 0.0 {
                        tile.x += x_amount;
                        tile.y += y_amount;
                        continue;
                    }
                    if x_amount != 0.0 {
                        if let Ok(animation) = VariableAnimation::new(x_amount, duration) {
                            tile.animations.push(AxisAnimation {
                                axis: Axis::X,
                                animation,
                            });
                        }
                    }
                    if y_amount != 0.0 {
                        if let Ok(animation) = VariableAnimation::new(y_amount, duration) {
                            tile.animations.push(AxisAnimation {
                                axis: Axis::Y,
                                animation,
                            });
                        }
                    }
                }
            }
        }
    }
}
