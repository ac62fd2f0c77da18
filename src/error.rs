use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("writing {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no user {0} directory")]
    NoUserDir(&'static str),

    #[error("locking {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        source: nix::errno::Errno,
    },

    #[error("connecting to mpv at {}: {source}", path.display())]
    Connect { path: PathBuf, source: io::Error },

    #[error("mpv ipc: {0}")]
    Io(#[from] io::Error),

    #[error("mpv closed the connection before answering")]
    Closed,

    #[error("malformed mpv response {line:?}: {reason}")]
    Malformed { line: String, reason: String },

    /// The `error` field of a reply, verbatim.
    #[error("{0}")]
    Protocol(String),

    #[error("unexpected value for {property}: {data}")]
    UnexpectedData {
        property: &'static str,
        data: serde_json::Value,
    },

    #[error("playlist is empty, add entries to {}", .0.display())]
    EmptyPlaylist(PathBuf),
}
