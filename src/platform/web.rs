//! Browser bindings

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::AudioSink;
use crate::game::Game;
use crate::persistence::{MemoryStorage, PersistenceError, PersistenceResult, Storage};
use crate::settings::Settings;
use crate::sim::battle::BattleType;
use crate::sim::events::{NoticeKind, Notifier};
use crate::sim::player::MoveVector;
use crate::upgrades::UpgradeKind;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("Tank Adventure core loaded");
}

fn js_err(e: JsValue) -> PersistenceError {
    PersistenceError::Storage(format!("{:?}", e))
}

/// `window.localStorage` as a `Storage` backend
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> PersistenceResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| PersistenceError::Storage("no window".to_string()))?;
        let inner = window
            .local_storage()
            .map_err(js_err)?
            .ok_or_else(|| PersistenceError::Storage("localStorage disabled".to_string()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        self.inner.get_item(key).map_err(js_err)
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.inner.set_item(key, value).map_err(js_err)
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        self.inner.remove_item(key).map_err(js_err)
    }
}

/// Forwards sounds or notifications to a page callback, if one is set
#[derive(Default)]
struct JsSink {
    callback: Option<Function>,
}

impl AudioSink for JsSink {
    fn play(&mut self, sound_id: &str, volume: f32) {
        if let Some(f) = &self.callback {
            if let Err(e) = f.call2(
                &JsValue::NULL,
                &JsValue::from_str(sound_id),
                &JsValue::from_f64(volume as f64),
            ) {
                log::warn!("sound callback failed: {:?}", e);
            }
        }
    }
}

impl Notifier for JsSink {
    fn notify(&mut self, message: &str, kind: NoticeKind) {
        let Some(f) = &self.callback else {
            log::info!("[{:?}] {}", kind, message);
            return;
        };
        let kind = match kind {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
        };
        if let Err(e) = f.call2(
            &JsValue::NULL,
            &JsValue::from_str(message),
            &JsValue::from_str(kind),
        ) {
            log::warn!("notify callback failed: {:?}", e);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeView {
    id: &'static str,
    name: &'static str,
    level: u32,
    max_level: u32,
    next_cost: Option<u32>,
}

/// Handle the page script drives once per animation frame
#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    audio: JsSink,
    notifier: JsSink,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let storage: Box<dyn Storage> = match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("Progress will not be kept: {}", e);
                Box::new(MemoryStorage::new())
            }
        };
        WebGame {
            game: Game::new(storage, js_sys::Date::now() as u64),
            audio: JsSink::default(),
            notifier: JsSink::default(),
        }
    }

    /// `f(soundId, volume)` for every sound the core triggers
    pub fn on_sound(&mut self, f: Function) {
        self.audio.callback = Some(f);
    }

    /// `f(message, kind)` for every notification
    pub fn on_notify(&mut self, f: Function) {
        self.notifier.callback = Some(f);
    }

    pub fn frame(&mut self, now_ms: f64) {
        self.game.frame(now_ms);
    }

    /// Merged joystick/keyboard movement
    pub fn set_movement(&mut self, x: f32, y: f32, magnitude: f32) {
        self.game.input.movement = MoveVector::new(x, y, magnitude);
    }

    pub fn set_shoot(&mut self, shoot: bool) {
        self.game.input.shoot = shoot;
    }

    pub fn cast_skill(&mut self, slot: usize) {
        self.game.input.cast_slot = Some(slot);
    }

    pub fn start_battle(&mut self, battle_type: &str) -> bool {
        let Some(battle_type) = BattleType::parse(battle_type) else {
            log::warn!("Unknown battle type '{}'", battle_type);
            return false;
        };
        self.game
            .start_battle(battle_type, js_sys::Date::now() as u64);
        true
    }

    pub fn choose_skill(&mut self, index: usize) -> bool {
        self.game.choose_skill(index)
    }

    pub fn skip_skill(&mut self) {
        self.game.skip_skill();
    }

    pub fn leave_results(&mut self, to_base: bool) {
        self.game.leave_results(to_base);
    }

    pub fn return_to_menu(&mut self) {
        self.game.return_to_menu();
    }

    pub fn purchase_upgrade(&mut self, id: &str) -> bool {
        match UpgradeKind::parse(id) {
            Some(kind) => self.game.purchase_upgrade(kind),
            None => false,
        }
    }

    pub fn reset_progress(&mut self) {
        self.game.reset_progress();
    }

    pub fn settings_json(&self) -> String {
        serde_json::to_string(&self.game.settings).unwrap_or_default()
    }

    /// Replace settings from a (possibly partial) JSON object
    pub fn set_settings_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                self.game.update_settings(settings);
                true
            }
            Err(e) => {
                log::warn!("Rejected settings: {}", e);
                false
            }
        }
    }

    pub fn upgrades_json(&self) -> String {
        let upgrades = &self.game.upgrades;
        let views: Vec<UpgradeView> = UpgradeKind::ALL
            .into_iter()
            .map(|kind| UpgradeView {
                id: kind.as_str(),
                name: kind.name(),
                level: upgrades.level(kind),
                max_level: kind.max_level(),
                next_cost: upgrades.next_cost(kind),
            })
            .collect();
        serde_json::to_string(&views).unwrap_or_default()
    }

    pub fn snapshot_json(&self) -> String {
        match self.game.snapshot().to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Snapshot failed: {}", e);
                String::new()
            }
        }
    }

    /// Play queued sounds, show notifications, and return the remaining
    /// events as JSON
    pub fn drain_events_json(&mut self) -> String {
        let rest = self.game.dispatch(&mut self.audio, &mut self.notifier);
        serde_json::to_string(&rest).unwrap_or_default()
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
