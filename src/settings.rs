use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use nix::fcntl::{Flock, FlockArg};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

const CONFIG_RELATIVE: &str = "waybar/yt-radio/config.json";
const CACHE_RELATIVE: &str = "yt-radio/yt-radio-cache";
const MPV_SOCKET: &str = "/tmp/mpvsocket";

// ------------------------- Config -------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playlist: Playlist,
    #[serde(default)]
    pub ipc: Ipc,
    #[serde(default)]
    pub logging: Logging,
}

/// `["a", "b"]` is navigated here, one `loadfile` per entry.
/// A bare `"https://.../playlist?list=..."` is handed to mpv whole and
/// navigated with `playlist-next`/`playlist-prev`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Playlist {
    Url(String),
    Entries(Vec<String>),
}

impl Default for Playlist {
    fn default() -> Self {
        Self::Entries(Vec::new())
    }
}

impl Playlist {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Url(url) => url.is_empty(),
            Self::Entries(entries) => entries.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipc {
    /// Read deadline for mpv replies; absent or 0 means block forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
}

impl Ipc {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: String,
}
fn default_level() -> String {
    "warn".into()
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

// ------------------------- Cache -------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    /// Signed so that a hand-edited negative value still loads; clamped on use.
    #[serde(default)]
    pub playing: i64,
}

// ------------------------- Paths -------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
    pub cache: PathBuf,
    pub socket: PathBuf,
}

impl Paths {
    pub fn resolve() -> Result<Self> {
        let config = dirs::config_dir().ok_or(Error::NoUserDir("config"))?;
        let cache = dirs::cache_dir().ok_or(Error::NoUserDir("cache"))?;
        Ok(Self {
            config: config.join(CONFIG_RELATIVE),
            cache: cache.join(CACHE_RELATIVE),
            socket: PathBuf::from(MPV_SOCKET),
        })
    }

    /// Same layout as `resolve`, rooted under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            config: root.join("config").join(CONFIG_RELATIVE),
            cache: root.join("cache").join(CACHE_RELATIVE),
            socket: root.join("mpvsocket"),
        }
    }

    pub fn lock(&self) -> PathBuf {
        self.cache.with_extension("lock")
    }
}

// ------------------------- JSON I/O -------------------------

/// Reads `path` as JSON. A missing file is created with `T::default()`.
pub fn load<T>(path: &Path) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let value = T::default();
            save(path, &value)?;
            info!(path = %path.display(), "created default file");
            Ok(value)
        }
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Plain overwrite, not atomic; the file has a single owner.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(write_err)?;
    }
    let json = serde_json::to_string(value).map_err(|e| write_err(io::Error::from(e)))?;
    fs::write(path, json).map_err(write_err)
}

// ------------------------- Lock -------------------------

/// Exclusive advisory lock serialising read-modify-write of the cache.
/// Released when dropped.
pub struct CacheLock {
    _flock: Flock<File>,
}

impl CacheLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })?;
        let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, source)| Error::Lock {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "cache lock held");
        Ok(Self { _flock: flock })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/cache");

        let cache: Cache = load(&path).unwrap();
        assert_eq!(cache, Cache::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"playing":0}"#);

        let config: Config = load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.playlist, Playlist::Entries(Vec::new()));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.ipc.read_timeout_ms, None);
    }

    #[test]
    fn cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache");
        save(&path, &Cache { playing: 7 }).unwrap();
        let back: Cache = load(&path).unwrap();
        assert_eq!(back.playing, 7);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load::<Config>(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
        // never overwritten on failure
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be read as a file
        let err = load::<Cache>(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Read { .. }), "{err:?}");
    }

    #[test]
    fn playlist_is_a_url_or_a_list() {
        let url: Config = serde_json::from_str(r#"{"playlist":"https://example.org/playlist?list=PLx"}"#).unwrap();
        assert_eq!(
            url.playlist,
            Playlist::Url("https://example.org/playlist?list=PLx".into())
        );

        let many: Config = serde_json::from_str(r#"{"playlist":["a","b"],"ipc":{"read_timeout_ms":250}}"#).unwrap();
        assert_eq!(many.playlist, Playlist::Entries(vec!["a".into(), "b".into()]));
        assert_eq!(many.ipc.read_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(many.logging, Logging::default());

        assert!(Playlist::default().is_empty());
        assert!(Playlist::Url(String::new()).is_empty());
        assert_eq!(serde_json::to_string(&Config::default().playlist).unwrap(), "[]");
    }

    #[test]
    fn zero_timeout_means_no_deadline() {
        let cfg: Config = serde_json::from_str(r#"{"ipc":{"read_timeout_ms":0}}"#).unwrap();
        assert_eq!(cfg.ipc.read_timeout(), None);
        assert_eq!(Ipc::default().read_timeout(), None);
    }

    #[test]
    fn paths_follow_fixed_layout() {
        let paths = Paths::under(Path::new("/x"));
        assert!(paths.config.ends_with("waybar/yt-radio/config.json"));
        assert!(paths.cache.ends_with("yt-radio/yt-radio-cache"));
        assert_eq!(paths.lock(), PathBuf::from("/x/cache/yt-radio/yt-radio-cache.lock"));
    }

    #[test]
    fn cache_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/cache.lock");
        let held = CacheLock::acquire(&path).unwrap();

        let other = File::open(&path).unwrap();
        let contended = Flock::lock(other, FlockArg::LockExclusiveNonblock);
        assert!(contended.is_err());

        drop(held);
        let other = File::open(&path).unwrap();
        assert!(Flock::lock(other, FlockArg::LockExclusiveNonblock).is_ok());
    }
}
