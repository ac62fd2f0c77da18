use std::path::PathBuf;

use clap::ValueEnum;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    channel::{Channel, Player},
    error::{Error, Result},
    settings::{self, Cache, CacheLock, Config, Paths, Playlist},
    status::Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Stop if playing, otherwise load the remembered entry
    Toggle,
    /// Skip forward one entry (only while playing)
    Next,
    /// Skip back one entry (only while playing)
    Previous,
    /// Print the Waybar JSON line
    Status,
}

impl Action {
    /// Whether the action can load a track and rewrite the cache.
    pub const fn may_persist(self) -> bool {
        !matches!(self, Self::Status)
    }
}

/// Per-invocation view of the player, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub is_playing: bool,
    pub current_index: usize,
}

/// What the caller still has to do once the player side is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Persist(Cache),
    Print(Status),
}

pub fn next_index(current: usize, len: usize) -> usize {
    (current + 1) % len
}

pub fn previous_index(current: usize, len: usize) -> usize {
    (current + len - 1) % len
}

/// Clamps a cached index that may predate a shorter playlist.
fn resolve_index(cached: i64, len: usize) -> usize {
    match usize::try_from(cached) {
        Ok(i) if i < len => i,
        _ => {
            if len > 0 {
                warn!(cached, len, "cached index out of range, starting from 0");
            }
            0
        }
    }
}

pub struct Session<P> {
    config: Config,
    cache: Cache,
    config_path: PathBuf,
    player: P,
}

impl<P: Player> Session<P> {
    pub const fn new(config: Config, cache: Cache, config_path: PathBuf, player: P) -> Self {
        Self {
            config,
            cache,
            config_path,
            player,
        }
    }

    pub fn snapshot(&mut self) -> Result<Snapshot> {
        let idle = self.player.get_property("idle-active")?;
        let idle = idle.as_bool().ok_or(Error::UnexpectedData {
            property: "idle-active",
            data: idle,
        })?;
        let current_index = match &self.config.playlist {
            Playlist::Entries(entries) => resolve_index(self.cache.playing, entries.len()),
            // mpv owns the length; only a negative index is stale
            Playlist::Url(_) => usize::try_from(self.cache.playing).unwrap_or_default(),
        };
        let snap = Snapshot {
            is_playing: !idle,
            current_index,
        };
        debug!(?snap, "session snapshot");
        Ok(snap)
    }

    pub fn run(&mut self, action: Action) -> Result<Effect> {
        // checked before anything is written to the socket
        if action.may_persist() && self.config.playlist.is_empty() {
            return Err(Error::EmptyPlaylist(self.config_path.clone()));
        }
        let snap = self.snapshot()?;
        self.dispatch(action, snap)
    }

    fn dispatch(&mut self, action: Action, snap: Snapshot) -> Result<Effect> {
        match (action, snap.is_playing) {
            (Action::Toggle, true) => {
                self.player.send(&[json!("stop")])?;
                Ok(Effect::None)
            }
            (Action::Toggle, false) => self.load(snap.current_index),
            (Action::Next, true) => self.skip(true, snap.current_index),
            (Action::Previous, true) => self.skip(false, snap.current_index),
            (Action::Next | Action::Previous, false) => {
                debug!(?action, "nothing playing, nothing to skip");
                Ok(Effect::None)
            }
            (Action::Status, true) => {
                let title = match self.player.get_property("media-title")? {
                    Value::String(title) => title,
                    Value::Null => String::new(),
                    data => {
                        return Err(Error::UnexpectedData {
                            property: "media-title",
                            data,
                        })
                    }
                };
                Ok(Effect::Print(Status::playing(&title)))
            }
            (Action::Status, false) => Ok(Effect::Print(Status::idle())),
        }
    }

    fn load(&mut self, index: usize) -> Result<Effect> {
        let args = match &self.config.playlist {
            Playlist::Entries(entries) => {
                vec![json!("loadfile"), json!(entries[index]), json!("replace")]
            }
            Playlist::Url(url) => vec![
                json!("loadfile"),
                json!(url),
                json!("replace"),
                json!(-1),
                json!(format!("playlist-start={index}")),
            ],
        };
        info!(index, entry = %args[1], "loading");
        self.player.send(&args)?;
        Ok(self.persist(index))
    }

    fn skip(&mut self, forward: bool, current: usize) -> Result<Effect> {
        let len = match &self.config.playlist {
            Playlist::Entries(entries) => Some(entries.len()),
            Playlist::Url(_) => None,
        };
        let Some(len) = len else {
            return self.skip_in_mpv(forward);
        };
        let index = if forward {
            next_index(current, len)
        } else {
            previous_index(current, len)
        };
        self.load(index)
    }

    /// mpv expanded the URL itself, so it moves and we read back where it landed.
    fn skip_in_mpv(&mut self, forward: bool) -> Result<Effect> {
        let verb = if forward { "playlist-next" } else { "playlist-prev" };
        self.player.request(&[json!(verb)])?;
        let pos = self.player.get_property("playlist-pos")?;
        let pos = pos.as_i64().ok_or(Error::UnexpectedData {
            property: "playlist-pos",
            data: pos,
        })?;
        // -1 when nothing is selected
        Ok(self.persist(usize::try_from(pos).unwrap_or_default()))
    }

    fn persist(&mut self, index: usize) -> Effect {
        self.cache.playing = i64::try_from(index).unwrap_or_default();
        Effect::Persist(self.cache)
    }

    pub fn into_player(self) -> P {
        self.player
    }
}

/// One whole invocation against the files and socket in `paths`.
///
/// Nothing touches the lock, the cache or the socket until the playlist
/// guard has passed. Only actions that can persist take the lock. A
/// `Persist` effect has already been saved when this returns.
pub fn invoke(paths: &Paths, config: Config, action: Action) -> Result<Effect> {
    if action.may_persist() && config.playlist.is_empty() {
        return Err(Error::EmptyPlaylist(paths.config.clone()));
    }
    // held until return so a double click cannot interleave cache writes
    let _lock = if action.may_persist() {
        Some(CacheLock::acquire(&paths.lock())?)
    } else {
        None
    };
    let cache: Cache = settings::load(&paths.cache)?;

    let channel = Channel::connect(&paths.socket, config.ipc.read_timeout())?;
    let mut session = Session::new(config, cache, paths.config.clone(), channel);
    let effect = session.run(action)?;
    drop(session);

    if let Effect::Persist(cache) = &effect {
        settings::save(&paths.cache, cache)?;
        info!(playing = cache.playing, "cache written");
    }
    Ok(effect)
}
