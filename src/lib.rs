//! yt-radio: one-shot mpv controller for a Waybar custom module.
//! - Each invocation performs one action (toggle/next/previous/status) and exits.
//! - Talks to an already running mpv over its JSON IPC socket, one command per line.
//! - Playlist lives in the config file: a list navigated here, or one playlist URL mpv navigates.
//! - The playing index survives in a tiny cache file.
//! - `status` prints `{"text": ..., "class": ...}` for the bar.

#![deny(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery, clippy::perf)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod channel;
pub mod error;
pub mod session;
pub mod settings;
pub mod status;

pub use channel::{Channel, Player};
pub use error::{Error, Result};
pub use session::{invoke, Action, Effect, Session, Snapshot};
pub use settings::{Cache, CacheLock, Config, Paths, Playlist};
pub use status::Status;
