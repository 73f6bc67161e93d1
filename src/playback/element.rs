//! Platform seam: the live audio element and the page that hosts it.

use crate::error::AudioError;

/// A looping media element, e.g. an `HTMLAudioElement`.
pub trait AudioElement {
    fn set_source(&mut self, src: &str);
    /// Drop the source so the platform can reclaim decoded audio.
    fn clear_source(&mut self);
    fn set_looping(&mut self, looping: bool);
    fn set_volume(&mut self, volume: f64);
    fn volume(&self) -> f64;
    fn is_paused(&self) -> bool;
    /// Request playback. On the web the request completes asynchronously;
    /// a later rejection leaves the element paused.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// Restart resource selection after the source changed.
    fn load(&mut self);
}

/// The page environment: creates the element, tells time and renders the
/// two status labels.
pub trait AudioHost {
    type Element: AudioElement;

    fn create_element(&mut self) -> Result<Self::Element, AudioError>;

    /// Monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;

    fn show_enabled(&mut self, _label: &str) {}

    fn show_volume(&mut self, _label: &str) {}

    /// Called when a volume refresh was deferred; the host should call
    /// `flush_display` after `delay_ms`.
    fn schedule_flush(&mut self, _delay_ms: f64) {}
}
