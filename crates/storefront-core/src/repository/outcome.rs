use chrono::{DateTime, Utc};

use crate::utils::age_display;

/// Where the data returned by a read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Fresh from the remote API, already reconciled into the local snapshot.
    Remote,
    /// The local snapshot, because the remote call failed.
    Local,
    /// The built-in seed set, because the remote failed and the snapshot is empty.
    Seed,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Remote => "remote",
            Source::Local => "local",
            Source::Seed => "seed",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a repository read, tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub source: Source,
    /// Last write time of the local snapshot when `source` is `Local`.
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> Fetched<T> {
    pub fn from_remote(data: T) -> Self {
        Self {
            data,
            source: Source::Remote,
            cached_at: None,
        }
    }

    pub fn from_local(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
        Self {
            data,
            source: Source::Local,
            cached_at,
        }
    }

    pub fn from_seed(data: T) -> Self {
        Self {
            data,
            source: Source::Seed,
            cached_at: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            source: self.source,
            cached_at: self.cached_at,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.source == Source::Remote
    }

    /// "remote", "local (5m ago)", "seed" and so on, for status lines.
    pub fn describe(&self) -> String {
        match self.cached_at {
            Some(at) if self.source == Source::Local => format!("{} ({})", self.source, age_display(at)),
            _ => self.source.to_string(),
        }
    }
}

/// What happened to the remote half of a best-effort write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteWrite {
    Accepted,
    Failed,
    /// Not attempted, e.g. a patch against an unknown id.
    Skipped,
}

/// What happened to the local half of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalWrite {
    Applied,
    /// Precondition not met (unknown id); nothing changed.
    Skipped,
    /// The store could not persist the change.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub remote: RemoteWrite,
    pub local: LocalWrite,
}

impl WriteOutcome {
    pub fn skipped() -> Self {
        Self {
            remote: RemoteWrite::Skipped,
            local: LocalWrite::Skipped,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.local == LocalWrite::Applied
    }

    /// Both the backend and the local snapshot took the write.
    pub fn is_synced(&self) -> bool {
        self.remote == RemoteWrite::Accepted && self.local == LocalWrite::Applied
    }
}

/// Outcome of a targeted field update, with the patched entity when one existed.
#[derive(Debug, Clone, PartialEq)]
pub struct Patched<E> {
    pub entity: Option<E>,
    pub outcome: WriteOutcome,
}
