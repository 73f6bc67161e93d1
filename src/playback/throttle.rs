//! Coalesces UI refreshes to at most one per interval.

/// Leading-edge throttle with a trailing flush.
///
/// The first request in a quiet period goes out immediately; requests that
/// land inside the interval are folded into one pending update that
/// [`Throttle::poll`] releases once the interval has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    interval_ms: f64,
    last_emit_ms: Option<f64>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval_ms: f64) -> Self {
        Throttle {
            interval_ms: interval_ms.max(0.0),
            last_emit_ms: None,
            pending: false,
        }
    }

    /// Ask for an update at `now_ms`. Returns true if it should be emitted
    /// right away; otherwise it is deferred.
    pub fn request(&mut self, now_ms: f64) -> bool {
        if self.ready(now_ms) {
            self.last_emit_ms = Some(now_ms);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Release a deferred update once the interval has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if self.pending && self.ready(now_ms) {
            self.last_emit_ms = Some(now_ms);
            self.pending = false;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Milliseconds until a deferred update may go out.
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        match self.last_emit_ms {
            Some(last) => (last + self.interval_ms - now_ms).max(0.0),
            None => 0.0,
        }
    }

    fn ready(&self, now_ms: f64) -> bool {
        match self.last_emit_ms {
            Some(last) => now_ms - last >= self.interval_ms,
            None => true,
        }
    }
}
