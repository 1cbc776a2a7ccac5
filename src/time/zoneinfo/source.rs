//! Zoneinfo sources and the order they are consulted in

use super::{archive, tzif, Location, ZoneInfoError};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Directories searched for a zone named by `TZ`, in order.
pub const ZONE_DIRECTORIES: [&str; 5] = [
    "/etc",
    "/usr/share/zoneinfo",
    "/usr/share/lib/zoneinfo",
    "/usr/lib/locale/TZ",
    "/etc/zoneinfo",
];

/// The host's configured local zone.
pub const LOCALTIME: &str = "/etc/localtime";

const ARCHIVE_SUFFIX: &str = ".zip";

type Result<T> = std::result::Result<T, ZoneInfoError>;

/// Read and parse the TZif file at `path`.
pub fn load_file(name: &str, path: &Path) -> Result<Location> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|err| ZoneInfoError::io(display.as_str(), err))?;

    let mut data = Vec::new();
    file.take(tzif::MAX_FILE_SIZE + 1)
        .read_to_end(&mut data)
        .map_err(|err| ZoneInfoError::io(display.as_str(), err))?;
    if data.len() as u64 > tzif::MAX_FILE_SIZE {
        return Err(ZoneInfoError::BadData("zoneinfo file too large"));
    }

    tzif::parse(name, &data)
}

/// Resolve the local zone from the value of `TZ` (`None` when unset).
#[cfg(unix)]
pub fn resolve_local(tz: Option<&str>) -> Result<Location> {
    resolve_local_in(tz, &ZONE_DIRECTORIES, Path::new(LOCALTIME))
}

#[cfg(not(unix))]
pub fn resolve_local(_tz: Option<&str>) -> Result<Location> {
    Err(ZoneInfoError::NotImplemented)
}

/// [`resolve_local`] against an explicit directory list and localtime file.
pub fn resolve_local_in<D: AsRef<Path>>(
    tz: Option<&str>,
    directories: &[D],
    localtime: &Path,
) -> Result<Location> {
    let tz = tz.map(|tz| tz.strip_prefix(':').unwrap_or(tz));

    match tz {
        Some(tz) if tz.ends_with(ARCHIVE_SUFFIX) => {
            archive::load_embedded(&tz[..tz.len() - ARCHIVE_SUFFIX.len()])
        }
        Some(tz) if !tz.is_empty() && tz != "UTC" => find(tz, directories),
        _ => load_file("Local", localtime),
    }
}

/// Load a location by name: built-in UTC, an absolute path, the system
/// directories, then the bundled archive.
pub fn load_named(name: &str) -> Result<Location> {
    if name.is_empty() || name == "UTC" {
        return Ok(Location::utc());
    }
    if name == "Local" {
        return super::local().map(|location| location.as_ref().clone());
    }
    find(name, &ZONE_DIRECTORIES)
}

fn find<D: AsRef<Path>>(name: &str, directories: &[D]) -> Result<Location> {
    if Path::new(name).is_absolute() {
        return load_file(name, Path::new(name));
    }
    if !is_valid_name(name) {
        return Err(ZoneInfoError::UnknownTimeZone(name.to_string()));
    }

    for directory in directories {
        let path: PathBuf = directory.as_ref().join(name);
        if !path.is_file() {
            continue;
        }
        match load_file(name, &path) {
            Ok(location) => return Ok(location),
            // Directories like /etc hold files that share a zone's name.
            Err(ZoneInfoError::BadData(_)) => continue,
            Err(err) => return Err(err),
        }
    }

    archive::load_embedded(name)
}

/// Relative zone names may not climb out of the zoneinfo directory.
fn is_valid_name(name: &str) -> bool {
    !name.split(['/', '\\']).any(|part| part == "..")
}
