//! # rotating-text-core
//!
//! Core engine for rotating text displays.
//!
//! This crate provides platform-agnostic logic for:
//! - Tracking the current text with advance/retreat/jump/reset and loop policy
//! - Splitting text into animatable units (characters, words, lines, delimiter)
//! - Computing staggered per-unit enter delays
//! - Keeping the container width in step with the current text
//! - Auto-advancing on a per-text timer
//!
//! The host supplies measurement, timers and the animation runtime through
//! [`TextProbe`], [`TimerHost`] and [`Presenter`].
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for configuration
//! - `toml` - Load [`RotationConfig`] from TOML
//! - `web` - DOM measurement probe, window timers and resize subscription
//!
//! ## Example
//!
//! ```rust,ignore
//! use rotating_text_core::{RotatingText, RotationConfig, RotationControl, SplitBy};
//!
//! let config = RotationConfig::new(["fast", "safe", "fun"])
//!     .split_by(SplitBy::Characters)
//!     .durations([1000, 3000]);
//!
//! let text = RotatingText::new(config, host)?.on_change(|i| log::info!("now {}", i));
//! let handle = text.handle();
//!
//! // From the host event loop
//! text.fire(timer_id);
//! // From an outside owner
//! handle.jump_to(2);
//! ```

mod config;
mod error;
pub mod overlay;
pub mod render;
mod rotation;
mod rotator;
mod segment;
mod sizing;
mod stagger;
mod timer;

pub use config::{
    FixedHeight, PresenceMode, RotationConfig, SplitBy, SpringConfig, StaggerFrom, UnitPose,
    UnitPoses,
};
pub use error::ConfigError;
pub use render::{Layout, Presenter, RenderElement, RenderFrame};
pub use rotation::{IndexState, LoopMode};
pub use rotator::{HostRuntime, RotatingText, RotationControl, RotationHandle, RotationState};
pub use segment::{AnimUnit, Element, Segmentation};
pub use sizing::{MonospaceProbe, TextProbe, WidthSpring, WidthSync, WidthTransition};
pub use timer::{RotationTimer, TimerHost, TimerId};

#[cfg(feature = "web")]
pub use render::web::{DomProbe, ResizeSubscription, WebHost, WindowTimers};
