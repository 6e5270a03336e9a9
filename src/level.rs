//! Level schema, the tile registry, and load/save
//!
//! A level is a JSON document: settings, a flat list of
//! `{ "type": "dotted.path", "data": {...} }` objects, and the best-known
//! completion record. The registry maps each dotted path to load/save/default
//! functions for one tile variant; level import and the editor palette both
//! resolve through it. An unresolvable path is fatal to the load — silently
//! dropping a tile would corrupt coin indexing and completion tracking.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::sim::geometry::Rotation;
use crate::sim::modes::GameMode;
use crate::sim::stage::{ColorSection, KeyColor};
use crate::sim::tiles::{OrbEffect, PadEffect, Tile, TileKind};

/// Fatal level-load failures
#[derive(Debug, Error)]
pub enum LevelError {
    /// The payload is not well-formed (bad JSON, or a tile data object
    /// missing required fields)
    #[error("level payload is not well-formed: {0}")]
    Parse(#[from] serde_json::Error),
    /// A tile's dotted `type` path does not resolve in the registry
    #[error("unknown tile type {path:?}")]
    UnknownTileType { path: String },
    /// A tile rotation outside the quarter-turn set
    #[error("tile rotation {degrees} is not a multiple of 90 degrees")]
    InvalidRotation { degrees: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    #[serde(rename = "colorbg")]
    pub color_bg: [f32; 3],
    #[serde(rename = "colorground")]
    pub color_ground: [f32; 3],
    pub gamemode: GameMode,
    pub platformer: bool,
}

/// Best completion seen so far: percentage plus one flag per coin, in level
/// order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCompletion {
    pub percentage: u32,
    pub coins: Vec<bool>,
}

/// One serialized tile: a registry path plus variant-specific data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelObject {
    #[serde(rename = "type")]
    pub type_path: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub settings: LevelSettings,
    pub objects: Vec<LevelObject>,
    #[serde(default)]
    pub completion: LevelCompletion,
    #[serde(default)]
    pub deleted: bool,
}

impl Level {
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Registry entry for one tile variant
pub struct TileSpec {
    /// Stable dotted path, the wire `type` of a level object
    pub path: &'static str,
    /// Build a tile from a data payload
    pub load: fn(&Value) -> Result<Tile, LevelError>,
    /// Serialize a tile back to its data payload
    pub save: fn(&Tile) -> Value,
    /// Editor-palette payload for a fresh tile at a grid position
    pub default_data: fn(x: f32, y: f32) -> Value,
}

/// Common payload shared by most variants
#[derive(Serialize, Deserialize)]
struct BasicData {
    x: f32,
    y: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorTriggerData {
    x: f32,
    y: f32,
    #[serde(default)]
    needs_touch: bool,
    section: ColorSection,
    color: [f32; 3],
    #[serde(default)]
    duration: f32,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveTriggerData {
    x: f32,
    y: f32,
    #[serde(default)]
    needs_touch: bool,
    target_group: String,
    #[serde(default)]
    x_amount: f32,
    #[serde(default)]
    y_amount: f32,
    #[serde(default)]
    duration: f32,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct MarkerData {
    x: f32,
    y: f32,
}

#[derive(Serialize, Deserialize)]
struct KeyData {
    x: f32,
    y: f32,
    #[serde(default)]
    groups: Vec<String>,
}

fn parse_rotation(degrees: f32) -> Result<Rotation, LevelError> {
    Rotation::from_degrees(degrees).ok_or(LevelError::InvalidRotation { degrees })
}

fn load_basic(data: &Value, kind: TileKind) -> Result<Tile, LevelError> {
    let d: BasicData = serde_json::from_value(data.clone())?;
    Ok(Tile::new(kind, d.x, d.y)
        .with_rotation(parse_rotation(d.rotation)?)
        .with_groups(d.groups))
}

fn save_basic(tile: &Tile) -> Value {
    json!({
        "x": tile.x,
        "y": tile.y,
        "rotation": tile.rotation.degrees(),
        "groups": tile.groups,
    })
}

fn default_basic(x: f32, y: f32) -> Value {
    json!({ "x": x, "y": y, "rotation": 0.0, "groups": [] })
}

fn load_color_trigger(data: &Value) -> Result<Tile, LevelError> {
    let d: ColorTriggerData = serde_json::from_value(data.clone())?;
    Ok(Tile::new(
        TileKind::ColorTrigger {
            needs_touch: d.needs_touch,
            activated: false,
            section: d.section,
            color: d.color,
            duration: d.duration,
        },
        d.x,
        d.y,
    )
    .with_groups(d.groups))
}

fn save_color_trigger(tile: &Tile) -> Value {
    match &tile.kind {
        TileKind::ColorTrigger {
            needs_touch,
            section,
            color,
            duration,
            ..
        } => json!({
            "x": tile.x,
            "y": tile.y,
            "needsTouch": needs_touch,
            "section": section,
            "color": color,
            "duration": duration,
            "groups": tile.groups,
        }),
        _ => save_basic(tile),
    }
}

fn load_move_trigger(data: &Value) -> Result<Tile, LevelError> {
    let d: MoveTriggerData = serde_json::from_value(data.clone())?;
    Ok(Tile::new(
        TileKind::MoveTrigger {
            needs_touch: d.needs_touch,
            activated: false,
            target_group: d.target_group,
            x_amount: d.x_amount,
            y_amount: d.y_amount,
            duration: d.duration,
        },
        d.x,
        d.y,
    )
    .with_groups(d.groups))
}

fn save_move_trigger(tile: &Tile) -> Value {
    match &tile.kind {
        TileKind::MoveTrigger {
            needs_touch,
            target_group,
            x_amount,
            y_amount,
            duration,
            ..
        } => json!({
            "x": tile.x,
            "y": tile.y,
            "needsTouch": needs_touch,
            "targetGroup": target_group,
            "xAmount": x_amount,
            "yAmount": y_amount,
            "duration": duration,
            "groups": tile.groups,
        }),
        _ => save_basic(tile),
    }
}

fn load_start_pos(data: &Value) -> Result<Tile, LevelError> {
    let d: MarkerData = serde_json::from_value(data.clone())?;
    Ok(Tile::new(TileKind::StartPos, d.x, d.y))
}

fn save_start_pos(tile: &Tile) -> Value {
    json!({ "x": tile.x, "y": tile.y })
}

fn load_key(data: &Value, color: KeyColor) -> Result<Tile, LevelError> {
    let d: KeyData = serde_json::from_value(data.clone())?;
    Ok(Tile::new(
        TileKind::Key {
            color,
            progress: 0.0,
            vel: Vec2::ZERO,
        },
        d.x,
        d.y,
    )
    .with_groups(d.groups))
}

fn save_key(tile: &Tile) -> Value {
    json!({ "x": tile.x, "y": tile.y, "groups": tile.groups })
}

fn load_coin(data: &Value) -> Result<Tile, LevelError> {
    load_basic(
        data,
        TileKind::Coin {
            progress: 0.0,
            already_got: false,
        },
    )
}

fn orb(effect: OrbEffect) -> TileKind {
    TileKind::Orb {
        effect,
        cooldown: 0.0,
    }
}

fn pad(effect: PadEffect) -> TileKind {
    TileKind::Pad {
        effect,
        cooldown: 0.0,
    }
}

/// Every tile variant in registry order. The editor palette is this table.
pub static TILE_REGISTRY: &[TileSpec] = &[
    TileSpec {
        path: "block.basic-block",
        load: |d| load_basic(d, TileKind::Block { half: false }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "block.half-block",
        load: |d| load_basic(d, TileKind::Block { half: true }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "death.basic-spike",
        load: |d| load_basic(d, TileKind::Spike { half: false }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "death.half-spike",
        load: |d| load_basic(d, TileKind::Spike { half: true }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.orb.jump",
        load: |d| load_basic(d, orb(OrbEffect::Jump)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.orb.black",
        load: |d| load_basic(d, orb(OrbEffect::Black)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.orb.gravity",
        load: |d| load_basic(d, orb(OrbEffect::Gravity)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.pad.jump",
        load: |d| load_basic(d, pad(PadEffect::Jump)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.pad.jump-small",
        load: |d| load_basic(d, pad(PadEffect::SmallJump)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "jump.pad.gravity",
        load: |d| load_basic(d, pad(PadEffect::Gravity)),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gamemode.cube",
        load: |d| load_basic(d, TileKind::ModePortal { mode: GameMode::Cube }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gamemode.ship",
        load: |d| load_basic(d, TileKind::ModePortal { mode: GameMode::Ship }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gamemode.ball",
        load: |d| load_basic(d, TileKind::ModePortal { mode: GameMode::Ball }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gamemode.wave",
        load: |d| load_basic(d, TileKind::ModePortal { mode: GameMode::Wave }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gravity-down",
        load: |d| load_basic(d, TileKind::GravityPortal { gravity: 1.0 }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "portal.gravity-up",
        load: |d| load_basic(d, TileKind::GravityPortal { gravity: -1.0 }),
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "special.trigger.color",
        load: load_color_trigger,
        save: save_color_trigger,
        default_data: |x, y| {
            json!({
                "x": x, "y": y, "needsTouch": false, "section": "ground",
                "color": [255.0, 0.0, 0.0], "duration": 0.0, "groups": [],
            })
        },
    },
    TileSpec {
        path: "special.trigger.move",
        load: load_move_trigger,
        save: save_move_trigger,
        default_data: |x, y| {
            json!({
                "x": x, "y": y, "needsTouch": false, "targetGroup": "",
                "xAmount": 0.0, "yAmount": 0.0, "duration": 0.0, "groups": [],
            })
        },
    },
    TileSpec {
        path: "special.start-pos",
        load: load_start_pos,
        save: save_start_pos,
        default_data: |x, y| json!({ "x": x, "y": y }),
    },
    TileSpec {
        path: "special.coin",
        load: load_coin,
        save: save_basic,
        default_data: default_basic,
    },
    TileSpec {
        path: "special.key.red",
        load: |d| load_key(d, KeyColor::Red),
        save: save_key,
        default_data: |x, y| json!({ "x": x, "y": y, "groups": [] }),
    },
    TileSpec {
        path: "special.key.green",
        load: |d| load_key(d, KeyColor::Green),
        save: save_key,
        default_data: |x, y| json!({ "x": x, "y": y, "groups": [] }),
    },
    TileSpec {
        path: "special.key.blue",
        load: |d| load_key(d, KeyColor::Blue),
        save: save_key,
        default_data: |x, y| json!({ "x": x, "y": y, "groups": [] }),
    },
];

/// Look up a dotted path; a miss is a fatal load error
pub fn resolve_tile(path: &str) -> Result<&'static TileSpec, LevelError> {
    TILE_REGISTRY
        .iter()
        .find(|spec| spec.path == path)
        .ok_or_else(|| LevelError::UnknownTileType {
            path: path.to_string(),
        })
}

/// Registry path for a live tile
pub fn tile_path(tile: &Tile) -> &'static str {
    match &tile.kind {
        TileKind::Block { half: false } => "block.basic-block",
        TileKind::Block { half: true } => "block.half-block",
        TileKind::Spike { half: false } => "death.basic-spike",
        TileKind::Spike { half: true } => "death.half-spike",
        TileKind::Orb { effect, .. } => match effect {
            OrbEffect::Jump => "jump.orb.jump",
            OrbEffect::Black => "jump.orb.black",
            OrbEffect::Gravity => "jump.orb.gravity",
        },
        TileKind::Pad { effect, .. } => match effect {
            PadEffect::Jump => "jump.pad.jump",
            PadEffect::SmallJump => "jump.pad.jump-small",
            PadEffect::Gravity => "jump.pad.gravity",
        },
        TileKind::ModePortal { mode } => match mode {
            GameMode::Cube => "portal.gamemode.cube",
            GameMode::Ship => "portal.gamemode.ship",
            GameMode::Ball => "portal.gamemode.ball",
            GameMode::Wave => "portal.gamemode.wave",
        },
        TileKind::GravityPortal { gravity } if *gravity > 0.0 => "portal.gravity-down",
        TileKind::GravityPortal { .. } => "portal.gravity-up",
        TileKind::ColorTrigger { .. } => "special.trigger.color",
        TileKind::MoveTrigger { .. } => "special.trigger.move",
        TileKind::StartPos => "special.start-pos",
        TileKind::Coin { .. } => "special.coin",
        TileKind::Key { color, .. } => match color {
            KeyColor::Red => "special.key.red",
            KeyColor::Green => "special.key.green",
            KeyColor::Blue => "special.key.blue",
        },
    }
}

/// Resolve and build one tile from its serialized form
pub fn load_tile(object: &LevelObject) -> Result<Tile, LevelError> {
    let spec = resolve_tile(&object.type_path)?;
    (spec.load)(&object.data)
}

/// Serialize a live tile back to its wire form
pub fn save_tile(tile: &Tile) -> LevelObject {
    let path = tile_path(tile);
    let data = match resolve_tile(path) {
        Ok(spec) => (spec.save)(tile),
        Err(_) => save_basic(tile),
    };
    LevelObject {
        type_path: path.to_string(),
        data,
    }
}
