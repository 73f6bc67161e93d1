//! One-shot transition guards.

/// A transition that may happen at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    /// Not armed; firing does nothing.
    Idle,
    /// Will fire on the next trigger.
    Armed,
    /// Already fired; stays spent.
    Fired,
}

impl OneShot {
    /// Arm an idle guard. A spent guard cannot be re-armed.
    pub fn arm(&mut self) -> bool {
        if *self == OneShot::Idle {
            *self = OneShot::Armed;
            true
        } else {
            false
        }
    }

    /// Fire if armed. Returns true exactly once per arming.
    pub fn try_fire(&mut self) -> bool {
        if *self == OneShot::Armed {
            *self = OneShot::Fired;
            true
        } else {
            false
        }
    }

    /// Drop an armed guard without firing it.
    pub fn disarm(&mut self) {
        if *self == OneShot::Armed {
            *self = OneShot::Idle;
        }
    }

    pub fn is_armed(&self) -> bool {
        *self == OneShot::Armed
    }

    pub fn has_fired(&self) -> bool {
        *self == OneShot::Fired
    }
}
