//! Gridrush - an auto-scrolling platformer simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player physics, tile collision, triggers, game state)
//! - `level`: Level schema, tile registry, load/save
//!
//! Rendering, input devices and network transport are host collaborators: the
//! engine consumes a handful of derived input booleans once per frame, exposes
//! display rectangles for everything it owns, and pushes completion reports
//! into a drainable outbox.

pub mod level;
pub mod sim;

pub use level::{Level, LevelError, LevelSettings};
pub use sim::{GameState, TickInput, tick};

use glam::Vec2;

/// Game tuning constants
///
/// World units are tile widths, y-up. One tick is one rendering frame; a tick
/// is subdivided into substeps so fast-falling players cannot tunnel through
/// thin tiles.
pub mod consts {
    /// Horizontal speed, tiles per tick (auto-scroll and platformer steering)
    pub const SCROLL_SPEED: f32 = 0.1;
    /// Substeps per tick = ceil(|vy| * SUBSTEP_SCALE) + 1
    pub const SUBSTEP_SCALE: f32 = 4.0;
    /// Ticks between death and respawn
    pub const RESPAWN_DELAY_TICKS: u32 = 30;

    /// Cube downward acceleration per tick
    pub const CUBE_GRAVITY: f32 = 0.028;
    /// Cube jump impulse
    pub const CUBE_JUMP_VY: f32 = 0.33;
    /// Ship thrust per tick while the activation input is held (or released)
    pub const SHIP_THRUST: f32 = 0.005;
    /// Wave vertical speed magnitude
    pub const WAVE_SPEED: f32 = 0.1;

    /// Orb/pad activation cooldown, ticks
    pub const ACTIVATION_COOLDOWN_TICKS: f32 = 10.0;
    /// Jump orb / jump pad impulse
    pub const ORB_JUMP_VY: f32 = 0.34;
    /// Small jump pad impulse
    pub const PAD_SMALL_JUMP_VY: f32 = 0.22;
    /// Black orb kick, applied against the gravity sign
    pub const BLACK_ORB_KICK: f32 = 0.7;
    /// Vertical speed handed out by gravity flips (orb and pad variants)
    pub const GRAVITY_FLIP_VY: f32 = 0.5;
    /// Hitbox padding around orbs
    pub const ORB_PADDING: f32 = 0.3;

    /// Fraction of the player hitbox forming each ground/ceiling contact band
    pub const BLOCK_EDGE_MARGIN: f32 = 0.3;
    /// Inset (per side) of the death hitbox relative to the mode hitbox
    pub const DEATH_HITBOX_INSET: f32 = 0.1;
    /// Per-substep step the player takes when easing onto a contact height
    pub const GROUND_SNAP_STEP: f32 = 0.1;
    /// Hitbox height of every portal, centered on its tile
    pub const PORTAL_HITBOX_HEIGHT: f32 = 3.0;

    /// Coin collection fade, ticks
    pub const COIN_FADE_TICKS: f32 = 100.0;
    /// Key collection drift/fade, ticks
    pub const KEY_FADE_TICKS: f32 = 30.0;

    /// Camera trails the player by this many tiles on x
    pub const CAMERA_X_LAG: f32 = 10.0;
    /// Camera y aim point sits this far below the player
    pub const CAMERA_Y_OFFSET: f32 = 5.0;
    /// Camera y never strays further than this from its aim point
    pub const CAMERA_Y_PAD: f32 = 7.0;
    /// Exponential smoothing weight for camera y
    pub const CAMERA_Y_SMOOTHING: f32 = 80.0;

    /// Stage width extends this far past the right-most tile
    pub const STAGE_WIDTH_PAD: f32 = 5.0;
    /// Stage height extends this far above the top-most tile
    pub const STAGE_HEIGHT_PAD: f32 = 15.0;
    /// Default spawn x when a level has no start marker (run-up before x=0)
    pub const DEFAULT_START_X: f32 = -3.0;
}

/// Map `n` from `[in_min, in_max]` to `[out_min, out_max]` (no clamping)
#[inline]
pub fn map_range(n: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (n - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Rotate `point` about `pivot` by `angle_deg` degrees (clockwise in y-up coords)
#[inline]
pub fn rotate_point(pivot: Vec2, point: Vec2, angle_deg: f32) -> Vec2 {
    let radians = angle_deg.to_radians();
    let (sin, cos) = radians.sin_cos();
    let d = point - pivot;
    Vec2::new(cos * d.x + sin * d.y + pivot.x, cos * d.y - sin * d.x + pivot.y)
}
