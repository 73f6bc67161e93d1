//! Playback lifecycle — owns the single background-music element.
//!
//! ```text
//! Uninitialized ──first use──▶ Ready ──play──▶ Playing ⇄ Paused
//!                                              │   ▲
//!                                   page hidden│   │page visible (intent)
//!                                              ▼   │
//!                                             Suspended
//! any ──teardown──▶ Released
//! ```
//!
//! The element is created lazily, starts on the primary asset, and swaps to
//! the synthesized loop at most once if that asset fails to load.

use crate::composition::CYBER_GROOVE;
use crate::dsp::engine::RenderSettings;
use crate::dsp::renderer::render_data_uri;
use crate::error::{AudioError, ChiploopError, SynthError};

use super::element::{AudioElement, AudioHost};
use super::guard::OneShot;
use super::state::{clamp_volume, volume_from_input, PlaybackState, Storage};
use super::throttle::Throttle;

/// Default location of the authored track, relative to the page.
pub const PRIMARY_ASSET: &str = "music/8bit-cyberpunk.mp3";

/// Produces the fallback source (a data URI) on demand.
pub type FallbackRenderer = Box<dyn FnMut(&RenderSettings) -> Result<String, SynthError>>;

/// Lifecycle phase, derived from the live element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Playing,
    Paused,
    /// Paused because the page was hidden; will resume when visible.
    Suspended,
    Released,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub primary_source: String,
    /// Step used by `volume_up` / `volume_down`.
    pub volume_step: f64,
    /// Minimum spacing between volume label refreshes.
    pub display_interval_ms: f64,
    pub render: RenderSettings,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            primary_source: PRIMARY_ASSET.to_string(),
            volume_step: 0.1,
            display_interval_ms: 100.0,
            render: RenderSettings::default(),
        }
    }
}

/// The live element plus its per-instance transition state.
struct AudioResource<E> {
    element: E,
    /// Armed at creation; fires on the first load error.
    fallback: OneShot,
    resume_on_visible: bool,
}

pub fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "🔊 Music: ON" } else { "🔇 Music: OFF" }
}

pub fn volume_label(volume: f64) -> String {
    format!("{}%", (clamp_volume(volume) * 100.0).round() as u32)
}

pub struct PlaybackManager<H: AudioHost, S: Storage> {
    host: H,
    storage: S,
    config: ManagerConfig,
    resource: Option<AudioResource<H::Element>>,
    released: bool,
    has_played: bool,
    /// Armed by a pending start; fires on the first pointer interaction.
    pointer_start: OneShot,
    display: Throttle,
    render_fallback: FallbackRenderer,
}

impl<H: AudioHost, S: Storage> PlaybackManager<H, S> {
    pub fn new(host: H, storage: S, config: ManagerConfig) -> Self {
        let display = Throttle::new(config.display_interval_ms);
        PlaybackManager {
            host,
            storage,
            config,
            resource: None,
            released: false,
            has_played: false,
            pointer_start: OneShot::Idle,
            display,
            render_fallback: Box::new(|settings: &RenderSettings| render_data_uri(&CYBER_GROOVE, settings)),
        }
    }

    /// Replace how the fallback source is produced.
    pub fn with_fallback_renderer(
        mut self,
        renderer: impl FnMut(&RenderSettings) -> Result<String, SynthError> + 'static,
    ) -> Self {
        self.render_fallback = Box::new(renderer);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Current persisted preferences.
    pub fn state(&self) -> PlaybackState {
        PlaybackState::load(&self.storage)
    }

    fn update_state(&mut self, f: impl FnOnce(&mut PlaybackState)) -> PlaybackState {
        let mut state = self.state();
        f(&mut state);
        state.store(&mut self.storage);
        state
    }

    pub fn phase(&self) -> Phase {
        if self.released {
            return Phase::Released;
        }
        match &self.resource {
            None => Phase::Uninitialized,
            Some(r) if !r.element.is_paused() => Phase::Playing,
            Some(r) if r.resume_on_visible => Phase::Suspended,
            Some(_) if self.has_played => Phase::Paused,
            Some(_) => Phase::Ready,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    pub fn pointer_start_armed(&self) -> bool {
        self.pointer_start.is_armed()
    }

    pub fn fallback_applied(&self) -> bool {
        self.resource.as_ref().is_some_and(|r| r.fallback.has_fired())
    }

    pub fn resume_on_visible(&self) -> bool {
        self.resource.as_ref().is_some_and(|r| r.resume_on_visible)
    }

    /// Page finished loading: settle stored flags, paint labels, and honour a
    /// start requested by the previous page.
    pub fn on_page_load(&mut self) {
        let state = self.update_state(|_| {});
        self.host.show_enabled(enabled_label(state.enabled));
        let label = volume_label(self.current_volume());
        self.host.show_volume(&label);

        if state.pending_start {
            self.update_state(|s| s.pending_start = false);
            tracing::debug!("pending start requested by previous page");
            if state.enabled {
                self.play();
            }
            self.pointer_start.arm();
        }
    }

    /// Entry point for a user gesture such as an "enter" button.
    pub fn start_after_gesture(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.play();
    }

    /// Flip the stored preference and start or stop accordingly. Returns the
    /// new setting.
    pub fn toggle_enabled(&mut self) -> bool {
        let enabled = !self.is_enabled();
        self.update_state(|s| s.enabled = enabled);
        if enabled {
            self.play();
        } else {
            self.pause();
            if let Some(resource) = self.resource.as_mut() {
                resource.resume_on_visible = false;
            }
        }
        self.host.show_enabled(enabled_label(enabled));
        enabled
    }

    /// Store a new volume and apply it to the live element if there is one.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = clamp_volume(volume);
        self.update_state(|s| s.volume = volume);
        if let Some(resource) = self.resource.as_mut() {
            resource.element.set_volume(volume);
        }
        self.refresh_volume_display();
    }

    /// [`set_volume`](Self::set_volume) for untyped input; non-numeric is 0.
    pub fn set_volume_input(&mut self, input: &str) {
        self.set_volume(volume_from_input(input));
    }

    /// Volume of the live element, creating it if needed.
    pub fn volume(&mut self) -> f64 {
        match self.ensure_audio() {
            Ok(resource) => resource.element.volume(),
            Err(e) => {
                tracing::debug!("reading stored volume: {e}");
                self.state().volume
            }
        }
    }

    pub fn volume_up(&mut self) {
        let step = self.config.volume_step;
        let current = self.volume();
        self.set_volume(current + step);
    }

    pub fn volume_down(&mut self) {
        let step = self.config.volume_step;
        let current = self.volume();
        self.set_volume(current - step);
    }

    /// The element reported a load error. The first one swaps in the
    /// synthesized loop; later ones are ignored.
    pub fn on_source_error(&mut self) {
        let Some(resource) = self.resource.as_mut() else {
            return;
        };
        if !resource.fallback.try_fire() {
            tracing::debug!("ignoring repeated source error");
            return;
        }

        tracing::info!("primary music asset unavailable, synthesizing fallback loop");
        if let Err(e) = self.apply_fallback() {
            tracing::warn!("Could not generate fallback chiptune: {e}");
        }
    }

    fn apply_fallback(&mut self) -> Result<(), ChiploopError> {
        let uri = (self.render_fallback)(&self.config.render)?;
        let resource = self
            .resource
            .as_mut()
            .ok_or_else(|| AudioError::Unavailable("no music element".to_string()))?;
        resource.element.set_source(&uri);
        resource.element.load();
        Ok(())
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        let enabled = self.is_enabled();
        let Some(resource) = self.resource.as_mut() else {
            return;
        };

        if hidden {
            if !resource.element.is_paused() {
                resource.element.pause();
                resource.resume_on_visible = enabled;
                tracing::debug!(resume = enabled, "page hidden, suspending music");
            }
        } else if resource.resume_on_visible {
            resource.resume_on_visible = false;
            // The preference may have changed while hidden (toggle, another tab).
            if enabled {
                self.play();
            }
        }
    }

    /// `pagehide`. A page kept in the back/forward cache is only suspended;
    /// anything else is teardown.
    pub fn on_page_hide(&mut self, persisted: bool) {
        if persisted {
            self.on_visibility_change(true);
        } else {
            self.release();
        }
    }

    /// `pageshow`. A page restored from the back/forward cache resumes like
    /// a page becoming visible.
    pub fn on_page_show(&mut self, persisted: bool) {
        if persisted {
            self.on_visibility_change(false);
        }
    }

    /// First pointer interaction after a pending start.
    pub fn on_pointer_down(&mut self) {
        if !self.pointer_start.try_fire() {
            return;
        }
        if self.is_enabled() {
            self.play();
        }
    }

    /// Page teardown: stop, drop the source, and never come back.
    pub fn release(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.element.pause();
            resource.element.clear_source();
            tracing::debug!("music element released");
        }
        self.pointer_start.disarm();
        self.released = true;
    }

    /// Emit a deferred volume label if its interval has passed.
    pub fn flush_display(&mut self) {
        let now = self.host.now_ms();
        if self.display.poll(now) {
            let label = volume_label(self.current_volume());
            self.host.show_volume(&label);
        } else if self.display.is_pending() {
            // Woken early; keep exactly one flush outstanding.
            let delay = self.display.remaining_ms(now);
            self.host.schedule_flush(delay);
        }
    }

    fn refresh_volume_display(&mut self) {
        let now = self.host.now_ms();
        let flush_outstanding = self.display.is_pending();
        if self.display.request(now) {
            let label = volume_label(self.current_volume());
            self.host.show_volume(&label);
        } else if !flush_outstanding {
            let delay = self.display.remaining_ms(now);
            self.host.schedule_flush(delay);
        }
    }

    /// Volume without forcing the element into existence.
    fn current_volume(&self) -> f64 {
        match &self.resource {
            Some(resource) => resource.element.volume(),
            None => self.state().volume,
        }
    }

    fn play(&mut self) {
        if let Err(e) = self.try_play() {
            tracing::warn!("BGM play blocked: {e}");
        }
    }

    fn try_play(&mut self) -> Result<(), ChiploopError> {
        let resource = self.ensure_audio()?;
        if resource.element.is_paused() {
            resource.element.play()?;
            self.has_played = true;
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            if !resource.element.is_paused() {
                resource.element.pause();
            }
        }
    }

    fn ensure_audio(&mut self) -> Result<&mut AudioResource<H::Element>, ChiploopError> {
        if self.released {
            return Err(AudioError::Unavailable("music element already released".to_string()).into());
        }
        if self.resource.is_none() {
            let volume = self.state().volume;
            let mut element = self.host.create_element()?;
            element.set_source(&self.config.primary_source);
            element.set_looping(true);
            element.set_volume(volume);
            self.resource = Some(AudioResource {
                element,
                fallback: OneShot::Armed,
                resume_on_visible: false,
            });
        }
        self.resource
            .as_mut()
            .ok_or_else(|| AudioError::Unavailable("no music element".to_string()).into())
    }
}
