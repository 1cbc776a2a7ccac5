//! Time zone resolution from TZif data
//!
//! A [`Location`] is built from a TZif file (see [`tzif`]), found through the
//! `TZ` environment variable, the system zoneinfo directories or the zoneinfo
//! archive bundled with the crate (see [`source`] and [`archive`]).
//!
//! Lookups after the last recorded transition are answered by the POSIX TZ
//! string stored in the file footer (see [`rule`]).
//!
//! The local zone is resolved once per process and cached; [`set_local`]
//! replaces the cached value, which keeps tests independent of the host.

pub mod archive;
pub mod rule;
pub mod source;
pub mod tzif;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lower bound of a lookup window that starts at the beginning of time.
pub const ALPHA: i64 = i64::MIN;
/// Upper bound of a lookup window that never ends.
pub const OMEGA: i64 = i64::MAX;

#[derive(Debug, thiserror::Error)]
pub enum ZoneInfoError {
    #[error("malformed time zone information: {0}")]
    BadData(&'static str),

    #[error("unknown time zone {0}")]
    UnknownTimeZone(String),

    #[error("zoneinfo resolution is not implemented on this platform")]
    NotImplemented,

    #[error("failed to read zoneinfo from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt zoneinfo archive: {0}")]
    CorruptArchive(&'static str),

    #[error("unsupported compression for {0} in zoneinfo archive")]
    UnsupportedCompression(String),
}

impl ZoneInfoError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ZoneInfoError::Io {
            path: path.into(),
            source,
        }
    }

    /// An equal error; `Io` keeps the kind and message of its source.
    fn duplicate(&self) -> Self {
        match self {
            ZoneInfoError::BadData(what) => ZoneInfoError::BadData(what),
            ZoneInfoError::UnknownTimeZone(name) => ZoneInfoError::UnknownTimeZone(name.clone()),
            ZoneInfoError::NotImplemented => ZoneInfoError::NotImplemented,
            ZoneInfoError::Io { path, source } => ZoneInfoError::Io {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            ZoneInfoError::CorruptArchive(what) => ZoneInfoError::CorruptArchive(what),
            ZoneInfoError::UnsupportedCompression(name) => ZoneInfoError::UnsupportedCompression(name.clone()),
        }
    }
}

/// A local time type: abbreviation, UTC offset and DST flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
    pub offset_seconds: i32,
    pub is_dst: bool,
}

/// The instant at which the local time type switches to `zones[zone_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTransition {
    /// Seconds since the Unix epoch
    pub when: i64,
    pub zone_index: usize,
    pub is_std: bool,
    pub is_utc: bool,
}

/// Result of resolving an instant against a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneLookup<'a> {
    pub name: &'a str,
    pub offset: i32,
    /// First second this answer is valid for
    pub start: i64,
    /// First second this answer is no longer valid for
    pub end: i64,
    pub is_dst: bool,
}

/// A named set of zones and the transitions between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    name: String,
    zones: Vec<Zone>,
    transitions: Vec<ZoneTransition>,
    extend: String,
    cache_start: i64,
    cache_end: i64,
    cache_zone: Option<Zone>,
}

impl Location {
    /// Coordinated Universal Time.
    pub fn utc() -> Self {
        Self::fixed("UTC", 0)
    }

    /// A location that always uses the same offset.
    pub fn fixed(name: impl Into<String>, offset_seconds: i32) -> Self {
        let name = name.into();
        let zone = Zone {
            name: name.clone(),
            offset_seconds,
            is_dst: false,
        };
        Self {
            name,
            zones: vec![zone.clone()],
            transitions: Vec::new(),
            extend: String::new(),
            cache_start: ALPHA,
            cache_end: OMEGA,
            cache_zone: Some(zone),
        }
    }

    /// Assemble a location and prime its cache around the current time.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        zones: Vec<Zone>,
        transitions: Vec<ZoneTransition>,
        extend: String,
    ) -> Self {
        let location = Self {
            name: name.into(),
            zones,
            transitions,
            extend,
            cache_start: ALPHA,
            cache_end: ALPHA,
            cache_zone: None,
        };
        location.cached_at(now_seconds())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn transitions(&self) -> &[ZoneTransition] {
        &self.transitions
    }

    /// POSIX TZ string from the TZif footer, empty when absent.
    pub fn extend(&self) -> &str {
        &self.extend
    }

    /// The cached window and the zone that is authoritative inside it.
    pub fn cache(&self) -> Option<(i64, i64, &Zone)> {
        self.cache_zone
            .as_ref()
            .map(|zone| (self.cache_start, self.cache_end, zone))
    }

    /// Re-prime the lookup cache around `sec`.
    pub fn cached_at(mut self, sec: i64) -> Self {
        self.cache_zone = None;
        self.cache_start = ALPHA;
        self.cache_end = ALPHA;

        let index = self.transitions.partition_point(|tx| tx.when <= sec);
        if index == 0 {
            return self;
        }
        let tx = self.transitions[index - 1];
        let mut start = tx.when;
        let mut end = self.transitions.get(index).map_or(OMEGA, |next| next.when);
        let mut zone = self.zones[tx.zone_index].clone();

        if index == self.transitions.len() && !self.extend.is_empty() {
            if let Some(found) = rule::evaluate(&self.extend, start, sec) {
                start = found.start;
                end = found.end;
                zone = Zone {
                    name: found.name.to_string(),
                    offset_seconds: found.offset,
                    is_dst: found.is_dst,
                };
            }
        }

        self.cache_start = start;
        self.cache_end = end;
        self.cache_zone = Some(zone);
        self
    }

    /// Resolve the zone in effect at `sec` seconds since the Unix epoch.
    pub fn lookup(&self, sec: i64) -> ZoneLookup<'_> {
        if let Some(zone) = &self.cache_zone {
            if self.cache_start <= sec && sec < self.cache_end {
                return ZoneLookup {
                    name: &zone.name,
                    offset: zone.offset_seconds,
                    start: self.cache_start,
                    end: self.cache_end,
                    is_dst: zone.is_dst,
                };
            }
        }
        self.lookup_uncached(sec)
    }

    fn lookup_uncached(&self, sec: i64) -> ZoneLookup<'_> {
        if self.zones.is_empty() {
            return ZoneLookup {
                name: "UTC",
                offset: 0,
                start: ALPHA,
                end: OMEGA,
                is_dst: false,
            };
        }

        let first = self.transitions.first();
        if first.map_or(true, |tx| sec < tx.when) {
            if first.is_none() && !self.extend.is_empty() {
                if let Some(found) = rule::evaluate(&self.extend, ALPHA, sec) {
                    return found;
                }
            }
            let zone = &self.zones[self.first_zone_index()];
            return ZoneLookup {
                name: &zone.name,
                offset: zone.offset_seconds,
                start: ALPHA,
                end: first.map_or(OMEGA, |tx| tx.when),
                is_dst: zone.is_dst,
            };
        }

        let index = self.transitions.partition_point(|tx| tx.when <= sec) - 1;
        let tx = &self.transitions[index];
        let zone = &self.zones[tx.zone_index];
        let end = self
            .transitions
            .get(index + 1)
            .map_or(OMEGA, |next| next.when);

        if index + 1 == self.transitions.len() && !self.extend.is_empty() {
            if let Some(found) = rule::evaluate(&self.extend, tx.when, sec) {
                return found;
            }
        }

        ZoneLookup {
            name: &zone.name,
            offset: zone.offset_seconds,
            start: tx.when,
            end,
            is_dst: zone.is_dst,
        }
    }

    /// Zone used for instants before the first transition.
    fn first_zone_index(&self) -> usize {
        if !self.first_zone_used() {
            return 0;
        }

        if let Some(first) = self.transitions.first() {
            if self.zones[first.zone_index].is_dst {
                if let Some(index) = (0..first.zone_index).rev().find(|&i| !self.zones[i].is_dst) {
                    return index;
                }
            }
        }

        self.zones.iter().position(|zone| !zone.is_dst).unwrap_or(0)
    }

    fn first_zone_used(&self) -> bool {
        self.transitions.iter().any(|tx| tx.zone_index == 0)
    }
}

static LOCAL: Mutex<Option<LocalState>> = Mutex::new(None);

/// Outcome of the one-time local resolution.
#[derive(Debug)]
enum LocalState {
    Resolved(Arc<Location>),
    Failed(ZoneInfoError),
}

/// The process-wide local location, resolved on first use.
///
/// Resolution runs once. A failure is cached as well: every later call
/// returns an equivalent error without touching the filesystem again, until
/// [`set_local`] or [`reset_local`] replaces the cached outcome. Callers that
/// want a zone regardless can fall back to [`Location::utc`].
pub fn local() -> Result<Arc<Location>, ZoneInfoError> {
    local_in(&LOCAL, || {
        let tz = std::env::var("TZ").ok();
        source::resolve_local(tz.as_deref())
    })
}

fn local_in<F>(slot: &Mutex<Option<LocalState>>, resolve: F) -> Result<Arc<Location>, ZoneInfoError>
where
    F: FnOnce() -> Result<Location, ZoneInfoError>,
{
    let mut cached = slot.lock();
    let state = match cached.take() {
        Some(state) => state,
        None => match resolve() {
            Ok(location) => LocalState::Resolved(Arc::new(location)),
            Err(err) => LocalState::Failed(err),
        },
    };

    let result = match &state {
        LocalState::Resolved(location) => Ok(Arc::clone(location)),
        LocalState::Failed(err) => Err(err.duplicate()),
    };
    *cached = Some(state);
    result
}

/// Replace the cached local location.
pub fn set_local(location: Location) {
    *LOCAL.lock() = Some(LocalState::Resolved(Arc::new(location)));
}

/// Forget the cached local location; the next [`local`] call resolves again.
pub fn reset_local() {
    *LOCAL.lock() = None;
}

/// Load a location by name.
///
/// `""` and `"UTC"` are built in. Absolute paths are read directly; other
/// names are searched in the system zoneinfo directories and then in the
/// bundled archive.
pub fn load(name: &str) -> Result<Location, ZoneInfoError> {
    source::load_named(name)
}

/// Parse caller supplied TZif data.
pub fn load_from_bytes(name: &str, data: &[u8]) -> Result<Location, ZoneInfoError> {
    tzif::parse(name, data)
}

pub(crate) fn now_seconds() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}
