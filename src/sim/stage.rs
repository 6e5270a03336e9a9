//! Camera tracking, stage colors and the key tally

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::level::LevelSettings;
use crate::sim::animation::InterpolatedColor;

/// Which stage color channel a color trigger retargets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSection {
    #[serde(rename = "bg")]
    Background,
    #[serde(rename = "ground")]
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyColor {
    Red,
    Green,
    Blue,
}

/// Collected/total key counts per color channel.
///
/// Drives the renderer's color-filter effect: each channel scales by
/// collected/total, with an untouched channel (total 0) passing through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyTally {
    pub red: [u32; 2],
    pub green: [u32; 2],
    pub blue: [u32; 2],
}

impl KeyTally {
    fn channel_mut(&mut self, color: KeyColor) -> &mut [u32; 2] {
        match color {
            KeyColor::Red => &mut self.red,
            KeyColor::Green => &mut self.green,
            KeyColor::Blue => &mut self.blue,
        }
    }

    /// Count a key placed in the level
    pub fn register(&mut self, color: KeyColor) {
        self.channel_mut(color)[1] += 1;
    }

    /// Count a key the player picked up
    pub fn collect(&mut self, color: KeyColor) {
        self.channel_mut(color)[0] += 1;
    }

    fn ratio(channel: [u32; 2]) -> f32 {
        if channel[1] == 0 {
            1.0
        } else {
            channel[0] as f32 / channel[1] as f32
        }
    }

    /// Per-channel filter ratios, 1.0 for channels with no keys at all
    pub fn ratios(&self) -> [f32; 3] {
        [
            Self::ratio(self.red),
            Self::ratio(self.green),
            Self::ratio(self.blue),
        ]
    }

    pub fn reset(&mut self) {
        *self = KeyTally::default();
    }
}

/// Camera, color and key state for the running level
#[derive(Debug, Clone)]
pub struct Stage {
    pub bg_color: InterpolatedColor,
    pub ground_color: InterpolatedColor,
    pub camera_x: f32,
    pub camera_y: f32,
    pub keys: KeyTally,
}

impl Stage {
    pub fn new(settings: &LevelSettings) -> Self {
        Self {
            bg_color: InterpolatedColor::from_rgb(settings.color_bg),
            ground_color: InterpolatedColor::from_rgb(settings.color_ground),
            camera_x: 0.0,
            camera_y: 0.0,
            keys: KeyTally::default(),
        }
    }

    pub fn color_mut(&mut self, section: ColorSection) -> &mut InterpolatedColor {
        match section {
            ColorSection::Background => &mut self.bg_color,
            ColorSection::Ground => &mut self.ground_color,
        }
    }

    /// Advance color tweens and track the player with the camera.
    /// X follows hard; y is smoothed but never strays past the pad.
    pub fn tick(&mut self, dt: f32, player_pos: Option<(f32, f32)>) {
        self.bg_color.tick(dt);
        self.ground_color.tick(dt);
        if let Some((px, py)) = player_pos {
            self.camera_x = (px - CAMERA_X_LAG).max(0.0);
            let target = (py - CAMERA_Y_OFFSET).max(0.0);
            self.camera_y =
                (self.camera_y * CAMERA_Y_SMOOTHING + target) / (CAMERA_Y_SMOOTHING + 1.0);
            self.camera_y = self
                .camera_y
                .clamp(target - CAMERA_Y_PAD, target + CAMERA_Y_PAD);
        }
    }

    /// Back to load-time state: camera home, colors from settings, tally
    /// emptied (totals are re-registered when tiles are re-imported)
    pub fn reset(&mut self, settings: &LevelSettings) {
        self.camera_x = 0.0;
        self.camera_y = 0.0;
        self.bg_color = InterpolatedColor::from_rgb(settings.color_bg);
        self.ground_color = InterpolatedColor::from_rgb(settings.color_ground);
        self.keys.reset();
    }
}
