//! Game state: everything a running level owns
//!
//! The state is the explicit simulation context: level settings, the live
//! tile list plus the pristine template it respawns from, the player slot,
//! stage, particles, RNG, completion tracking and the outbox of progress
//! reports for the host's persistence collaborator.

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::level::{Level, LevelCompletion, LevelError, LevelSettings, load_tile};
use crate::sim::particles::Particles;
use crate::sim::player::Player;
use crate::sim::stage::Stage;
use crate::sim::tick::TickInput;
use crate::sim::tiles::{Tile, TileKind};

/// Progress snapshot pushed to the outbox on every death or win. The host
/// drains these and owns transport and retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub level: String,
    pub percentage: u32,
    pub coins: Vec<bool>,
}

/// Complete simulation state for one loaded level
#[derive(Debug, Clone)]
pub struct GameState {
    pub level_name: String,
    pub settings: LevelSettings,
    /// Best-known completion, max-merged on every report
    pub completion: LevelCompletion,
    /// Pristine tiles as imported; respawn clones these
    pub(crate) template: Vec<Tile>,
    pub tiles: Vec<Tile>,
    pub player: Option<Player>,
    pub stage: Stage,
    pub particles: Particles,
    /// Input latch for the current tick batch; press edges are consumed
    /// in place by mode logic
    pub input: TickInput,
    pub stage_width: f32,
    pub stage_height: f32,
    pub won: bool,
    pub attempt: u32,
    /// Ticks until respawn; zero while the player is alive
    pub death_countdown: u32,
    /// High-water mark of player x this session
    pub furthest_x: f32,
    pub outbox: Vec<CompletionReport>,
    pub seed: u64,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Resolve and import a parsed level. Unknown tile types and bad tile
    /// payloads abort the whole load.
    pub fn from_level(level: Level, seed: u64) -> Result<Self, LevelError> {
        let mut template = Vec::with_capacity(level.objects.len());
        let mut stage_width: f32 = 0.0;
        let mut stage_height: f32 = 0.0;
        for object in &level.objects {
            let tile = load_tile(object)?;
            stage_width = stage_width.max(tile.x + STAGE_WIDTH_PAD);
            stage_height = stage_height.max(tile.y + STAGE_HEIGHT_PAD);
            template.push(tile);
        }

        let mut state = Self {
            stage: Stage::new(&level.settings),
            level_name: level.name,
            settings: level.settings,
            completion: level.completion,
            template,
            tiles: Vec::new(),
            player: None,
            particles: Particles::new(),
            input: TickInput::default(),
            stage_width,
            stage_height,
            won: false,
            attempt: 1,
            death_countdown: 0,
            furthest_x: 0.0,
            outbox: Vec::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
        };
        state.import_tiles();
        state.player = Some(Player::spawn(
            &state.tiles,
            state.settings.gamemode,
            state.settings.platformer,
        ));
        info!(
            "Loaded level {:?}: {} tiles, stage {:.0}x{:.0}, mode {}",
            state.level_name,
            state.tiles.len(),
            state.stage_width,
            state.stage_height,
            state.settings.gamemode.key(),
        );
        Ok(state)
    }

    /// Rebuild the live tile list from the template: coins already banked in
    /// the completion record stay marked, key totals re-register.
    fn import_tiles(&mut self) {
        self.tiles = self.template.clone();
        let mut coin_no = 0;
        for tile in &mut self.tiles {
            match &mut tile.kind {
                TileKind::Coin { already_got, .. } => {
                    if self.completion.coins.get(coin_no).copied().unwrap_or(false) {
                        *already_got = true;
                    }
                    coin_no += 1;
                }
                TileKind::Key { color, .. } => self.stage.keys.register(*color),
                _ => {}
            }
        }
    }

    /// Fresh attempt: stage back to load-time state, tiles re-imported,
    /// a new player at the start marker.
    pub fn respawn(&mut self) {
        self.stage.reset(&self.settings);
        self.particles.clear();
        self.import_tiles();
        self.attempt += 1;
        self.player = Some(Player::spawn(
            &self.tiles,
            self.settings.gamemode,
            self.settings.platformer,
        ));
        debug!("respawn: attempt {}", self.attempt);
    }

    /// Completion percentage from the clamped high-water mark
    pub fn completion_percent(&self) -> u32 {
        if self.stage_width <= 0.0 {
            return 0;
        }
        let x = self.furthest_x.clamp(0.0, self.stage_width);
        ((x / self.stage_width) * 100.0).floor() as u32
    }

    /// Collected flag per coin, in import order
    pub fn coin_flags(&self) -> Vec<bool> {
        self.tiles.iter().filter_map(Tile::coin_collected).collect()
    }

    /// Merge current progress into the completion record and queue a report.
    /// Percentage and coin flags only ever ratchet up, so reports are
    /// monotone across attempts.
    pub(crate) fn report_progress(&mut self) {
        let percentage = self.completion_percent();
        self.completion.percentage = self.completion.percentage.max(percentage);
        let coins = self.coin_flags();
        if self.completion.coins.len() < coins.len() {
            self.completion.coins.resize(coins.len(), false);
        }
        for (banked, collected) in self.completion.coins.iter_mut().zip(&coins) {
            *banked = *banked || *collected;
        }
        self.outbox.push(CompletionReport {
            level: self.level_name.clone(),
            percentage: self.completion.percentage,
            coins: self.completion.coins.clone(),
        });
    }

    /// Reap a dead player: burst of particles, a progress report, and the
    /// respawn countdown.
    pub(crate) fn on_death(&mut self) {
        if let Some(player) = self.player.take() {
            self.furthest_x = self.furthest_x.max(player.x);
            self.particles
                .spawn_death_burst(&mut self.rng, player.x + 0.5, player.y + 0.5);
            self.death_countdown = RESPAWN_DELAY_TICKS;
            self.report_progress();
            debug!(
                "death at x {:.2} (attempt {}), {}% complete",
                player.x, self.attempt, self.completion.percentage
            );
        }
    }

    /// The player crossed the stage width: latch the win and report.
    pub(crate) fn on_win(&mut self) {
        self.furthest_x = self.stage_width;
        self.won = true;
        self.player = None;
        self.report_progress();
        info!(
            "level {:?} complete on attempt {}",
            self.level_name, self.attempt
        );
    }
}
