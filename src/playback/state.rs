//! Persisted playback preferences.
//!
//! The page keeps three string flags in key/value storage. They are parsed
//! into [`PlaybackState`] by [`PlaybackState::load`] and written back by
//! [`PlaybackState::store`]; nothing else touches the raw strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `"on"` / `"off"`; absent means on.
pub const ENABLED_KEY: &str = "bgm_enabled";
/// Float in [0, 1] as a string.
pub const VOLUME_KEY: &str = "bgm_volume";
/// `"true"` when a previous page asked for playback to start here.
pub const PENDING_KEY: &str = "bgm_pending";

pub const DEFAULT_VOLUME: f64 = 0.35;

/// Key/value persistence shared across page navigations.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-process storage, for native use and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        MemoryStorage {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// User preferences that survive page navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub enabled: bool,
    /// Always within [0, 1].
    pub volume: f64,
    pub pending_start: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            enabled: true,
            volume: DEFAULT_VOLUME,
            pending_start: false,
        }
    }
}

impl PlaybackState {
    pub fn load(storage: &impl Storage) -> Self {
        PlaybackState {
            enabled: parse_enabled(storage.get(ENABLED_KEY).as_deref()),
            volume: parse_volume(storage.get(VOLUME_KEY).as_deref()),
            pending_start: parse_pending(storage.get(PENDING_KEY).as_deref()),
        }
    }

    pub fn store(&self, storage: &mut impl Storage) {
        storage.set(ENABLED_KEY, if self.enabled { "on" } else { "off" });
        storage.set(VOLUME_KEY, &clamp_volume(self.volume).to_string());
        if self.pending_start {
            storage.set(PENDING_KEY, "true");
        } else {
            storage.remove(PENDING_KEY);
        }
    }
}

/// Anything other than an explicit `"off"` counts as enabled.
pub fn parse_enabled(raw: Option<&str>) -> bool {
    raw != Some("off")
}

/// Stored volume, falling back to the default when absent or unparsable.
pub fn parse_volume(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| !v.is_nan())
        .map(clamp_volume)
        .unwrap_or(DEFAULT_VOLUME)
}

pub fn parse_pending(raw: Option<&str>) -> bool {
    raw == Some("true")
}

/// Clamp to [0, 1]; NaN becomes 0.
pub fn clamp_volume(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Numeric value of free-form volume input: blank or non-numeric text is 0.
pub fn volume_from_input(input: &str) -> f64 {
    clamp_volume(input.trim().parse::<f64>().unwrap_or(0.0))
}
