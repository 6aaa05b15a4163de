//! AR view for content items
//!
//! Opens an augmented-reality view of one content item: decides between an
//! immersive session with surface hit-testing and a camera passthrough with
//! tap-to-place, runs the per-frame placement loop and releases every
//! platform resource on close.
//!
//! # Modules
//!
//! - [`view`]: [`ArView`] lifecycle and frame loop
//! - [`config`]: [`ArConfig`] (TOML file plus `AR_*` environment overrides)
//! - [`commands`]: fire-and-forget [`ViewCommand`] channel to the host
//! - [`sim`]: simulated runtime and camera for development and tests
//! - [`error`]: error types

pub mod commands;
pub mod config;
pub mod error;
pub mod sim;
pub mod view;

pub use commands::{command_channel, CommandSender, ViewCommand};
pub use config::ArConfig;
pub use error::{ArError, Result};
pub use view::{ArContext, ArView, FrameInput};
