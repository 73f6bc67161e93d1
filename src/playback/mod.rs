//! Background-music playback: persisted preferences and the lifecycle of the
//! single audio element.

pub mod element;
pub mod guard;
pub mod manager;
pub mod state;
pub mod throttle;

pub use element::{AudioElement, AudioHost};
pub use manager::{ManagerConfig, Phase, PlaybackManager};
pub use state::{MemoryStorage, PlaybackState, Storage};
