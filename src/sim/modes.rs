//! Player locomotion policies: Cube, Ship, Ball, Wave
//!
//! Every mode answers the same four questions: how gravity integrates, how
//! the activation input resolves after tiles have reacted, what hitbox the
//! player presents, and whether hitting a ceiling is lethal. The mode is a
//! plain `Copy` value owned by the player; portals replace it wholesale.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::geometry::Rect;
use crate::sim::particles::Particles;
use crate::sim::player::Player;
use crate::sim::tick::TickInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Cube,
    Ship,
    Ball,
    Wave,
}

/// Borrowed context for the post-tick jump resolution
pub struct JumpCtx<'a> {
    pub input: &'a mut TickInput,
    pub platformer: bool,
    pub particles: &'a mut Particles,
    pub rng: &'a mut Pcg32,
    /// Set when a special action fires, so the loop can start the arming
    /// orb's cooldown and flash
    pub fired_special: Option<usize>,
}

impl GameMode {
    /// Stable registry key, also the wire form in level settings
    pub fn key(self) -> &'static str {
        match self {
            GameMode::Cube => "cube",
            GameMode::Ship => "ship",
            GameMode::Ball => "ball",
            GameMode::Wave => "wave",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "cube" => Some(GameMode::Cube),
            "ship" => Some(GameMode::Ship),
            "ball" => Some(GameMode::Ball),
            "wave" => Some(GameMode::Wave),
            _ => None,
        }
    }

    /// The player hitbox this mode presents at (x, y)
    pub fn hitbox(self, x: f32, y: f32) -> Rect {
        let full = Rect::new(x, y, 1.0, 1.0);
        match self {
            GameMode::Wave => full.relative(0.0, 0.1, 1.0, 0.8),
            _ => full,
        }
    }

    pub fn dies_from_ceiling(self) -> bool {
        matches!(self, GameMode::Cube | GameMode::Wave)
    }

    /// Gravity half of the mode contract, run during the player pre-tick.
    /// The wave reads the previous substep's ground contact here, before the
    /// contact state is cleared.
    pub fn integrate_gravity(self, player: &mut Player, dt: f32, input: &TickInput) {
        match self {
            GameMode::Cube | GameMode::Ball => {
                player.vy -= CUBE_GRAVITY * player.gravity * dt;
            }
            GameMode::Ship => {}
            GameMode::Wave => {
                player.vy = if input.pressing {
                    WAVE_SPEED * player.gravity
                } else {
                    -WAVE_SPEED * player.gravity
                };
                if let Some(ground) = player.ground_height {
                    player.y = ground - if player.gravity >= 0.0 { 0.1 } else { 0.9 };
                }
            }
        }
    }

    /// Input/contact half of the mode contract, run in the player post-tick
    /// of the same substep that tiles wrote `ground_height` in.
    pub fn check_jump(self, player: &mut Player, dt: f32, ctx: &mut JumpCtx<'_>) {
        match self {
            GameMode::Cube => cube_jump(player, dt, ctx),
            GameMode::Ship => ship_jump(player, dt, ctx),
            GameMode::Ball => ball_jump(player, dt, ctx),
            GameMode::Wave => wave_jump(player, ctx),
        }
    }
}

/// Consume an armed special action: apply its effect now and report the
/// arming orb so the loop can cool it down.
fn fire_special(player: &mut Player, ctx: &mut JumpCtx<'_>) {
    if let Some(action) = player.special.take() {
        action.effect.apply(player);
        ctx.fired_special = Some(action.tile);
    }
}

/// Ease the player onto the contact height in fixed steps, landing exactly
/// on it. `zero_vy` kills residual velocity while stepping (ship and ball).
fn step_onto_ground(player: &mut Player, ground: f32, zero_vy: bool) {
    if player.gravity < 0.0 {
        let height = player.hitbox().h;
        if player.y + height > ground {
            if zero_vy {
                player.vy = 0.0;
            }
            player.y -= GROUND_SNAP_STEP;
            if player.y + height < ground {
                player.y = ground - height;
            }
        }
    } else if player.y < ground {
        if zero_vy {
            player.vy = 0.0;
        }
        player.y += GROUND_SNAP_STEP;
        if player.y > ground {
            player.y = ground;
        }
    }
}

/// Spawn the ground-contact sparks for whichever direction is being driven.
/// Offsets are relative to the player origin and differ per mode.
fn spawn_slide_sparks(
    player: &Player,
    ctx: &mut JumpCtx<'_>,
    right_offset: (f32, f32),
    left_offset: (f32, f32),
) {
    if !ctx.platformer || ctx.input.pressing_right {
        ctx.particles.spawn_slide(
            ctx.rng,
            player.x + right_offset.0,
            player.y + right_offset.1,
            1.0,
            player.gravity,
        );
    }
    if ctx.platformer && ctx.input.pressing_left {
        ctx.particles.spawn_slide(
            ctx.rng,
            player.x + left_offset.0,
            player.y + left_offset.1,
            -1.0,
            player.gravity,
        );
    }
}

fn cube_jump(player: &mut Player, dt: f32, ctx: &mut JumpCtx<'_>) {
    if let Some(ground) = player.ground_height {
        // Ease the rotation toward the next 90-degree multiple.
        let target = ((player.rotation - 45.0) / 90.0).floor() * 90.0 + 90.0;
        player.rotation = (target + player.rotation * 2.0) / 3.0;
        let spark_y = if player.gravity < 0.0 { 0.5 } else { -0.5 };
        spawn_slide_sparks(player, ctx, (-0.5, spark_y), (0.5, spark_y));
        step_onto_ground(player, ground, false);
    } else {
        player.rotation += 5.0 * dt * player.gravity;
    }
    if ctx.input.pressing {
        if player.special.is_some() && ctx.input.just_pressed {
            fire_special(player, ctx);
            ctx.input.just_pressed = false;
        } else if player.ground_height.is_some() {
            player.vy = CUBE_JUMP_VY * player.gravity;
            ctx.input.just_pressed = false;
        }
    }
}

fn ship_jump(player: &mut Player, dt: f32, ctx: &mut JumpCtx<'_>) {
    player.rotation = player.vy * -100.0;
    if ctx.input.pressing {
        if player.special.is_some() && ctx.input.just_pressed {
            fire_special(player, ctx);
        } else {
            player.vy += SHIP_THRUST * player.gravity * dt;
        }
        ctx.input.just_pressed = false;
    } else {
        player.vy -= SHIP_THRUST * player.gravity * dt;
    }
    // Engine exhaust trails whether or not the ship is grounded.
    let spark_y = if player.gravity < 0.0 { 0.8 } else { 0.2 };
    spawn_slide_sparks(player, ctx, (0.05, spark_y), (0.95, spark_y));
    if let Some(ground) = player.ground_height {
        step_onto_ground(player, ground, true);
    }
}

fn ball_jump(player: &mut Player, dt: f32, ctx: &mut JumpCtx<'_>) {
    if !ctx.platformer || ctx.input.pressing_right {
        player.rotation += 10.0 * dt * player.gravity;
    }
    if ctx.platformer && ctx.input.pressing_left {
        player.rotation -= 10.0 * dt * player.gravity;
    }
    if let Some(ground) = player.ground_height {
        let spark_y = if player.gravity < 0.0 { 1.0 } else { 0.0 };
        spawn_slide_sparks(player, ctx, (0.3, spark_y), (0.7, spark_y));
        step_onto_ground(player, ground, true);
    }
    if ctx.input.just_pressed {
        if player.special.is_some() {
            fire_special(player, ctx);
        } else if player.ground_height.is_some() {
            player.gravity = -player.gravity;
        }
        ctx.input.just_pressed = false;
    }
}

fn wave_jump(player: &mut Player, ctx: &mut JumpCtx<'_>) {
    player.rotation = player.vy * -450.0;
    ctx.particles
        .spawn_wave_trail(player.x, player.y - player.vy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::SpecialAction;
    use crate::sim::tiles::OrbEffect;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn ctx_parts() -> (TickInput, Particles, Pcg32) {
        (TickInput::default(), Particles::new(), Pcg32::seed_from_u64(1))
    }

    fn player(mode: GameMode) -> Player {
        Player::spawn(&[], mode, false)
    }

    #[test]
    fn test_cube_gravity_integration() {
        let mut p = player(GameMode::Cube);
        GameMode::Cube.integrate_gravity(&mut p, 1.0, &TickInput::default());
        assert_relative_eq!(p.vy, -0.028);
        p.gravity = -1.0;
        GameMode::Cube.integrate_gravity(&mut p, 1.0, &TickInput::default());
        assert_relative_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_ship_has_no_passive_gravity() {
        let mut p = player(GameMode::Ship);
        GameMode::Ship.integrate_gravity(&mut p, 1.0, &TickInput::default());
        assert_relative_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_ship_thrust_follows_input_level() {
        let mut p = player(GameMode::Ship);
        let (mut input, mut particles, mut rng) = ctx_parts();
        input.pressing = true;
        let mut ctx = JumpCtx {
            input: &mut input,
            platformer: false,
            particles: &mut particles,
            rng: &mut rng,
            fired_special: None,
        };
        GameMode::Ship.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.vy, 0.005);
        ctx.input.pressing = false;
        GameMode::Ship.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_cube_jumps_only_when_grounded() {
        let mut p = player(GameMode::Cube);
        let (mut input, mut particles, mut rng) = ctx_parts();
        input.pressing = true;
        input.just_pressed = true;
        let mut ctx = JumpCtx {
            input: &mut input,
            platformer: false,
            particles: &mut particles,
            rng: &mut rng,
            fired_special: None,
        };
        GameMode::Cube.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.vy, 0.0);

        p.ground_height = Some(0.0);
        GameMode::Cube.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.vy, 0.33);
    }

    #[test]
    fn test_ball_flips_gravity_on_press_edge_only() {
        let mut p = player(GameMode::Ball);
        p.ground_height = Some(0.0);
        let (mut input, mut particles, mut rng) = ctx_parts();
        input.pressing = true;
        input.just_pressed = true;
        let mut ctx = JumpCtx {
            input: &mut input,
            platformer: false,
            particles: &mut particles,
            rng: &mut rng,
            fired_special: None,
        };
        GameMode::Ball.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.gravity, -1.0);
        // Edge was consumed; holding does not flip again.
        assert!(!ctx.input.just_pressed);
        GameMode::Ball.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.gravity, -1.0);
    }

    #[test]
    fn test_wave_sets_velocity_directly() {
        let mut p = player(GameMode::Wave);
        let mut input = TickInput::default();
        input.pressing = true;
        GameMode::Wave.integrate_gravity(&mut p, 1.0, &input);
        assert_relative_eq!(p.vy, 0.1);
        input.pressing = false;
        GameMode::Wave.integrate_gravity(&mut p, 1.0, &input);
        assert_relative_eq!(p.vy, -0.1);
    }

    #[test]
    fn test_wave_hitbox_is_vertically_trimmed() {
        let rect = GameMode::Wave.hitbox(2.0, 3.0);
        assert_relative_eq!(rect.y, 3.1);
        assert_relative_eq!(rect.h, 0.8);
        let rect = GameMode::Cube.hitbox(2.0, 3.0);
        assert_relative_eq!(rect.h, 1.0);
    }

    #[test]
    fn test_ceiling_lethality_by_mode() {
        assert!(GameMode::Cube.dies_from_ceiling());
        assert!(GameMode::Wave.dies_from_ceiling());
        assert!(!GameMode::Ship.dies_from_ceiling());
        assert!(!GameMode::Ball.dies_from_ceiling());
    }

    #[test]
    fn test_special_consumed_on_edge() {
        let mut p = player(GameMode::Cube);
        p.special = Some(SpecialAction {
            tile: 3,
            effect: OrbEffect::Jump,
        });
        let (mut input, mut particles, mut rng) = ctx_parts();
        input.pressing = true;
        input.just_pressed = true;
        let mut ctx = JumpCtx {
            input: &mut input,
            platformer: false,
            particles: &mut particles,
            rng: &mut rng,
            fired_special: None,
        };
        GameMode::Cube.check_jump(&mut p, 1.0, &mut ctx);
        assert_relative_eq!(p.vy, 0.34);
        assert_eq!(ctx.fired_special, Some(3));
        assert!(p.special.is_none());
    }

    #[test]
    fn test_ground_snap_steps_and_clamps() {
        let mut p = player(GameMode::Ship);
        p.y = 0.75;
        step_onto_ground(&mut p, 1.0, true);
        assert_relative_eq!(p.y, 0.85);
        step_onto_ground(&mut p, 1.0, true);
        assert_relative_eq!(p.y, 0.95);
        step_onto_ground(&mut p, 1.0, true);
        assert_relative_eq!(p.y, 1.0);
        step_onto_ground(&mut p, 1.0, true);
        assert_relative_eq!(p.y, 1.0);
    }
}
