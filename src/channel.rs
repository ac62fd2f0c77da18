//! mpv JSON IPC over a blocking Unix socket.
//!
//! One command per line out, one reply per line back, strictly in send order.
//! No request ids and no pipelining: every `request` waits for its own reply
//! before returning. Unsolicited `{"event": ...}` lines are skipped.

use std::{
    io::{BufRead, BufReader, Write},
    os::unix::net::UnixStream,
    path::Path,
    time::Duration,
};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

const SUCCESS: &str = "success";

/// Anything that accepts mpv commands. `Channel` is the real one.
pub trait Player {
    /// Fire-and-forget: the reply is not awaited.
    fn send(&mut self, args: &[Value]) -> Result<()>;

    /// Sends and returns the reply's `data`; a non-"success" `error` becomes `Error::Protocol`.
    fn request(&mut self, args: &[Value]) -> Result<Value>;

    fn get_property(&mut self, name: &str) -> Result<Value> {
        self.request(&[json!("get_property"), json!(name)])
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    error: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug)]
pub struct Channel {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    // replies owed to earlier `send`s, consumed before the next `request`
    unanswered: usize,
}

impl Channel {
    /// `read_timeout` of `None` or zero blocks until mpv answers.
    pub fn connect(path: &Path, read_timeout: Option<Duration>) -> Result<Self> {
        let read_timeout = read_timeout.filter(|d| !d.is_zero());
        let stream = UnixStream::connect(path).map_err(|source| Error::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        stream.set_read_timeout(read_timeout)?;
        debug!(socket = %path.display(), ?read_timeout, "connected to mpv");
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: UnixStream) -> Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            unanswered: 0,
        })
    }

    fn write_command(&mut self, args: &[Value]) -> Result<()> {
        let mut line = json!({ "command": args }).to_string();
        debug!(command = %line, "mpv <-");
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn read_reply(&mut self) -> Result<Reply> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(Error::Closed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let malformed = |reason: String| Error::Malformed {
                line: trimmed.to_string(),
                reason,
            };
            let value: Value = serde_json::from_str(trimmed).map_err(|e| malformed(e.to_string()))?;
            if value.get("error").is_none() && value.get("event").is_some() {
                trace!(event = %trimmed, "mpv event skipped");
                continue;
            }
            debug!(reply = %trimmed, "mpv ->");
            return serde_json::from_value(value).map_err(|e| malformed(e.to_string()));
        }
    }
}

impl Player for Channel {
    fn send(&mut self, args: &[Value]) -> Result<()> {
        self.write_command(args)?;
        self.unanswered += 1;
        Ok(())
    }

    fn request(&mut self, args: &[Value]) -> Result<Value> {
        while self.unanswered > 0 {
            let stale = self.read_reply()?;
            self.unanswered -= 1;
            if stale.error != SUCCESS {
                warn!(error = %stale.error, "earlier mpv command failed");
            }
        }
        self.write_command(args)?;
        let reply = self.read_reply()?;
        if reply.error == SUCCESS {
            Ok(reply.data)
        } else {
            Err(Error::Protocol(reply.error))
        }
    }
}
