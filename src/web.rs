//! Browser glue: drives a [`PlaybackManager`] from an `HTMLAudioElement`,
//! `localStorage` and page lifecycle events.
//!
//! ```js
//! const music = new MusicController();
//! music.install();
//! enterButton.onclick = () => music.startAfterGesture();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Document, Event, HtmlAudioElement, PageTransitionEvent, Window};

use crate::error::AudioError;
use crate::playback::{AudioElement, AudioHost, ManagerConfig, PlaybackManager, Storage};

type WebManager = PlaybackManager<WebHost, LocalStorage>;

/// Route `tracing` output to the browser console.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_wasm::{WASMLayer, WASMLayerConfigBuilder};

    let config = WASMLayerConfigBuilder::new()
        .set_max_level(tracing::Level::INFO)
        .build();
    // A second call keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(WASMLayer::new(config))
        .try_init();
}

fn js_error(e: JsValue) -> AudioError {
    AudioError::Unavailable(format!("{e:?}"))
}

/// Whether a `pagehide`/`pageshow` event involves the back/forward cache.
fn is_persisted(event: &Event) -> bool {
    event
        .dyn_ref::<PageTransitionEvent>()
        .is_some_and(|e| e.persisted())
}

/// Run `f` against the manager if it is still alive and not mid-call.
fn with_manager(weak: &Weak<RefCell<WebManager>>, f: impl FnOnce(&mut WebManager)) {
    let Some(manager) = weak.upgrade() else {
        return;
    };
    match manager.try_borrow_mut() {
        Ok(mut manager) => f(&mut manager),
        Err(_) => tracing::warn!("music controller busy, dropping event"),
    };
}

/// `window.localStorage`, or nothing when storage is blocked.
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn new(window: &Window) -> Self {
        let inner = window.local_storage().ok().flatten();
        if inner.is_none() {
            tracing::warn!("localStorage unavailable, music preferences will not persist");
        }
        LocalStorage { inner }
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.inner {
            if let Err(e) = storage.set_item(key, value) {
                tracing::warn!("could not persist {key}: {e:?}");
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.inner {
            let _ = storage.remove_item(key);
        }
    }
}

pub struct WebAudioElement {
    el: HtmlAudioElement,
}

impl AudioElement for WebAudioElement {
    fn set_source(&mut self, src: &str) {
        self.el.set_src(src);
    }

    fn clear_source(&mut self) {
        let _ = self.el.remove_attribute("src");
        self.el.load();
        self.el.remove();
    }

    fn set_looping(&mut self, looping: bool) {
        self.el.set_loop(looping);
    }

    fn set_volume(&mut self, volume: f64) {
        self.el.set_volume(volume);
    }

    fn volume(&self) -> f64 {
        self.el.volume()
    }

    fn is_paused(&self) -> bool {
        self.el.paused()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let promise = self
            .el
            .play()
            .map_err(|e| AudioError::PlayRejected(format!("{e:?}")))?;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                tracing::warn!("BGM play blocked: {e:?}");
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.el.pause() {
            tracing::warn!("could not pause music: {e:?}");
        }
    }

    fn load(&mut self) {
        self.el.load();
    }
}

pub struct WebHost {
    window: Window,
    document: Document,
    manager: Weak<RefCell<WebManager>>,
}

impl WebHost {
    fn set_text(&self, selector: &str, text: &str) {
        if let Ok(Some(node)) = self.document.query_selector(selector) {
            node.set_text_content(Some(text));
        }
    }
}

impl AudioHost for WebHost {
    type Element = WebAudioElement;

    fn create_element(&mut self) -> Result<WebAudioElement, AudioError> {
        let el = HtmlAudioElement::new().map_err(js_error)?;
        el.set_preload("auto");
        el.set_attribute("data-bgm", "true").map_err(js_error)?;

        let weak = self.manager.clone();
        let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            with_manager(&weak, |m| m.on_source_error());
        });
        el.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
            .map_err(js_error)?;
        on_error.forget();

        if let Some(body) = self.document.body() {
            body.append_child(&el).map_err(js_error)?;
        }
        Ok(WebAudioElement { el })
    }

    fn now_ms(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn show_enabled(&mut self, label: &str) {
        self.set_text("[data-bgm-toggle]", label);
    }

    fn show_volume(&mut self, label: &str) {
        self.set_text("[data-bgm-volume]", label);
    }

    fn schedule_flush(&mut self, delay_ms: f64) {
        let weak = self.manager.clone();
        let timeout = Timeout::new(delay_ms.ceil() as u32, move || {
            with_manager(&weak, |m| m.flush_display());
        });
        let _ = timeout.forget();
    }
}

/// JS-facing control surface for the page's background music.
#[wasm_bindgen]
pub struct MusicController {
    inner: Rc<RefCell<WebManager>>,
}

#[wasm_bindgen]
impl MusicController {
    /// `primary_source` overrides the default track path.
    #[wasm_bindgen(constructor)]
    pub fn new(primary_source: Option<String>) -> Result<MusicController, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let mut config = ManagerConfig::default();
        if let Some(src) = primary_source {
            config.primary_source = src;
        }

        let storage = LocalStorage::new(&window);
        let inner = Rc::new_cyclic(|weak| {
            let host = WebHost {
                window,
                document,
                manager: weak.clone(),
            };
            RefCell::new(PlaybackManager::new(host, storage, config))
        });
        Ok(MusicController { inner })
    }

    /// Run page-load handling and hook visibility, teardown and the
    /// first-pointer fallback. Call once, after the DOM is ready.
    pub fn install(&self) -> Result<(), JsValue> {
        let (window, document) = {
            let mut manager = self.inner.borrow_mut();
            manager.on_page_load();
            let host = manager.host();
            (host.window.clone(), host.document.clone())
        };

        let weak = Rc::downgrade(&self.inner);
        let doc = document.clone();
        let on_visibility = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            let hidden = doc.hidden();
            with_manager(&weak, |m| m.on_visibility_change(hidden));
        });
        document.add_event_listener_with_callback("visibilitychange", on_visibility.as_ref().unchecked_ref())?;
        on_visibility.forget();

        let weak = Rc::downgrade(&self.inner);
        let on_hide = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let persisted = is_persisted(&event);
            with_manager(&weak, |m| m.on_page_hide(persisted));
        });
        window.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())?;
        on_hide.forget();

        let weak = Rc::downgrade(&self.inner);
        let on_show = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let persisted = is_persisted(&event);
            with_manager(&weak, |m| m.on_page_show(persisted));
        });
        window.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref())?;
        on_show.forget();

        if self.inner.borrow().pointer_start_armed() {
            let weak = Rc::downgrade(&self.inner);
            let on_pointer = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                with_manager(&weak, |m| m.on_pointer_down());
            });
            let options = AddEventListenerOptions::new();
            options.set_once(true);
            window.add_event_listener_with_callback_and_add_event_listener_options(
                "pointerdown",
                on_pointer.as_ref().unchecked_ref(),
                &options,
            )?;
            on_pointer.forget();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = startAfterGesture)]
    pub fn start_after_gesture(&self) {
        with_manager(&Rc::downgrade(&self.inner), |m| m.start_after_gesture());
    }

    #[wasm_bindgen(js_name = toggleEnabled)]
    pub fn toggle_enabled(&self) -> bool {
        let mut enabled = false;
        with_manager(&Rc::downgrade(&self.inner), |m| enabled = m.toggle_enabled());
        enabled
    }

    /// Accepts a number or numeric string; anything else sets 0.
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, value: JsValue) {
        with_manager(&Rc::downgrade(&self.inner), |m| {
            if let Some(v) = value.as_f64() {
                m.set_volume(v);
            } else if let Some(s) = value.as_string() {
                m.set_volume_input(&s);
            } else {
                m.set_volume(0.0);
            }
        });
    }

    #[wasm_bindgen(js_name = volumeUp)]
    pub fn volume_up(&self) {
        with_manager(&Rc::downgrade(&self.inner), |m| m.volume_up());
    }

    #[wasm_bindgen(js_name = volumeDown)]
    pub fn volume_down(&self) {
        with_manager(&Rc::downgrade(&self.inner), |m| m.volume_down());
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().is_enabled()
    }

    /// Persisted preferences as `{ enabled, volume, pendingStart }`.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        let state = self.inner.borrow().state();
        serde_wasm_bindgen::to_value(&state).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Tear down now instead of waiting for `pagehide`.
    pub fn release(&self) {
        with_manager(&Rc::downgrade(&self.inner), |m| m.release());
    }
}
