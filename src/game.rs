//! Host-facing game driver
//!
//! `Game` wraps a `Battle` with everything that outlives it: settings, coin
//! upgrades, the storage handle and the frame clock. Hosts call `frame`
//! once per animation frame with a wall-clock timestamp and drive scene
//! changes through the methods below.

use crate::audio::{AudioSink, MixedAudio};
use crate::consts::MAX_FRAME_DT_MS;
use crate::persistence::{self, SaveData, Storage};
use crate::settings::Settings;
use crate::sim::battle::{Battle, BattleType, Scene, TickInput};
use crate::sim::events::{Notifier, SimEvent};
use crate::sim::skills::SkillManager;
use crate::sim::snapshot::RenderSnapshot;
use crate::upgrades::{UpgradeKind, Upgrades};

pub struct Game {
    pub battle: Battle,
    pub settings: Settings,
    pub upgrades: Upgrades,
    /// Input applied on the next frame. `cast_slot` is consumed by it.
    pub input: TickInput,
    storage: Box<dyn Storage>,
    last_time: Option<f64>,
    /// Set once the current results screen has been written out
    results_saved: bool,
}

impl Game {
    /// Restore meta progression from `storage` and sit on the menu
    pub fn new(storage: Box<dyn Storage>, seed: u64) -> Self {
        let save = SaveData::load_or_default(storage.as_ref());
        let settings = Settings::load(storage.as_ref());

        let mut battle = Battle::new(seed, save.progression);
        battle.skills.load_passive_levels(&save.passives);
        battle.options = settings.battle_options();
        battle.apply_bonuses(save.upgrades.bonuses());

        Self {
            battle,
            settings,
            upgrades: save.upgrades,
            input: TickInput::default(),
            storage,
            last_time: None,
            results_saved: false,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn scene(&self) -> Scene {
        self.battle.scene
    }

    /// Advance by the time since the previous frame, capped so a
    /// backgrounded tab resumes with a single short step
    pub fn frame(&mut self, now_ms: f64) {
        let dt = match self.last_time {
            Some(last) => ((now_ms - last) as f32).clamp(0.0, MAX_FRAME_DT_MS),
            None => 0.0,
        };
        self.last_time = Some(now_ms);
        self.step(dt);
    }

    /// Advance by an explicit `dt` (ms)
    pub fn step(&mut self, dt: f32) {
        self.battle.step(dt, &self.input);
        self.input.cast_slot = None;

        if self.battle.scene == Scene::Results && !self.results_saved {
            self.results_saved = true;
            self.save();
        }
    }

    pub fn start_battle(&mut self, battle_type: BattleType, seed: u64) {
        self.battle.options = self.settings.battle_options();
        self.battle
            .start(battle_type, seed, self.upgrades.bonuses());
        self.input = TickInput::default();
        self.results_saved = false;
    }

    pub fn choose_skill(&mut self, index: usize) -> bool {
        self.battle.choose_skill(index)
    }

    pub fn skip_skill(&mut self) {
        self.battle.skip_skill();
    }

    pub fn leave_results(&mut self, to_base: bool) {
        self.battle.leave_results(to_base);
    }

    /// Back to the menu from anywhere. A running battle is abandoned; what
    /// kills already paid is kept.
    pub fn return_to_menu(&mut self) {
        let was_fighting = matches!(self.battle.scene, Scene::Battle | Scene::SkillSelection);
        self.battle.abandon();
        if was_fighting {
            self.save();
        }
    }

    /// Buy one level of an upgrade and rebuild the squad's stats
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let bought = self.upgrades.purchase(
            kind,
            &mut self.battle.player.progression,
            &mut self.battle.events,
        );
        if bought {
            self.battle.apply_bonuses(self.upgrades.bonuses());
            self.save();
        }
        bought
    }

    pub fn update_settings(&mut self, mut settings: Settings) {
        settings.sanitize();
        self.battle.options = settings.battle_options();
        self.battle.skills.auto_cast = settings.auto_cast;
        settings.save(self.storage.as_mut());
        self.settings = settings;
    }

    /// Wipe all stored progress and start over from level 1
    pub fn reset_progress(&mut self) {
        self.battle.abandon();
        if let Err(e) = persistence::reset_progress(self.storage.as_mut(), &mut self.battle.events) {
            log::warn!("Failed to clear storage: {}", e);
        }
        self.battle.player.progression = Default::default();
        self.battle.skills = SkillManager::new();
        self.upgrades = Upgrades::new();
        self.settings = Settings::default();
        self.battle.options = self.settings.battle_options();
        self.battle.apply_bonuses(self.upgrades.bonuses());
    }

    /// Write progression, passive skills and upgrades
    pub fn save(&mut self) {
        let data = SaveData {
            progression: self.battle.player.progression.clone(),
            passives: self.battle.skills.passive_levels(),
            upgrades: self.upgrades.clone(),
        };
        if let Err(e) = data.save(self.storage.as_mut()) {
            log::warn!("Failed to save progress: {}", e);
        }
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.battle)
    }

    /// Send queued sounds (volume-gated by settings) and notifications to
    /// the host, returning the rest for the renderer
    pub fn dispatch(
        &mut self,
        audio: &mut dyn AudioSink,
        notifier: &mut dyn Notifier,
    ) -> Vec<SimEvent> {
        let mut mixed = MixedAudio::new(
            audio,
            self.settings.master_volume,
            self.settings.sfx_volume,
            self.settings.muted,
        );
        self.battle.events.dispatch(&mut mixed, notifier)
    }
}
