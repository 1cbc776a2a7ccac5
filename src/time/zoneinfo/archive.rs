//! Zoneinfo archives: uncompressed zip files of TZif entries
//!
//! With the `embedded-tzdata` feature a gzip-compressed archive of the IANA
//! database is compiled into the crate and inflated on first use.

use super::{tzif, Location, ZoneInfoError};
#[cfg(feature = "embedded-tzdata")]
use flate2::read::GzDecoder;
#[cfg(feature = "embedded-tzdata")]
use std::io::Read;
use std::sync::OnceLock;

const END_OF_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;
const END_OF_DIRECTORY_LEN: usize = 22;
const DIRECTORY_ENTRY_SIGNATURE: u32 = 0x0201_4b50;
const DIRECTORY_ENTRY_LEN: usize = 46;
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const LOCAL_HEADER_LEN: usize = 30;
const METHOD_STORED: u16 = 0;

type Result<T> = std::result::Result<T, ZoneInfoError>;

fn le_u16(data: &[u8], at: usize) -> Result<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(ZoneInfoError::CorruptArchive("truncated record"))
}

fn le_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ZoneInfoError::CorruptArchive("truncated record"))
}

/// Find the stored entry called `name` in `zip`.
///
/// Returns `Ok(None)` when the archive is well formed but has no such entry.
pub fn find<'a>(zip: &'a [u8], name: &str) -> Result<Option<&'a [u8]>> {
    if zip.len() < END_OF_DIRECTORY_LEN {
        return Err(ZoneInfoError::CorruptArchive("too short"));
    }
    let end = zip.len() - END_OF_DIRECTORY_LEN;
    if le_u32(zip, end)? != END_OF_DIRECTORY_SIGNATURE {
        return Err(ZoneInfoError::CorruptArchive("missing end of central directory"));
    }
    let entries = le_u16(zip, end + 10)?;
    let mut at = le_u32(zip, end + 16)? as usize;

    for _ in 0..entries {
        if le_u32(zip, at)? != DIRECTORY_ENTRY_SIGNATURE {
            return Err(ZoneInfoError::CorruptArchive("bad central directory entry"));
        }
        let method = le_u16(zip, at + 10)?;
        let size = le_u32(zip, at + 24)? as usize;
        let name_len = usize::from(le_u16(zip, at + 28)?);
        let extra_len = usize::from(le_u16(zip, at + 30)?);
        let comment_len = usize::from(le_u16(zip, at + 32)?);
        let local = le_u32(zip, at + 42)? as usize;

        let entry_name = zip
            .get(at + DIRECTORY_ENTRY_LEN..at + DIRECTORY_ENTRY_LEN + name_len)
            .ok_or(ZoneInfoError::CorruptArchive("truncated entry name"))?;
        at += DIRECTORY_ENTRY_LEN + name_len + extra_len + comment_len;

        if entry_name != name.as_bytes() {
            continue;
        }
        if method != METHOD_STORED {
            return Err(ZoneInfoError::UnsupportedCompression(name.to_string()));
        }

        if le_u32(zip, local)? != LOCAL_HEADER_SIGNATURE {
            return Err(ZoneInfoError::CorruptArchive("bad local file header"));
        }
        let local_name_len = usize::from(le_u16(zip, local + 26)?);
        let local_extra_len = usize::from(le_u16(zip, local + 28)?);
        let start = local + LOCAL_HEADER_LEN + local_name_len + local_extra_len;

        return zip
            .get(start..start + size)
            .map(Some)
            .ok_or(ZoneInfoError::CorruptArchive("truncated entry data"));
    }

    Ok(None)
}

/// Load `name` from the TZif entries of `zip`.
pub fn load_from_zip(name: &str, zip: &[u8]) -> Result<Location> {
    match find(zip, name)? {
        Some(data) => tzif::parse(name, data),
        None => Err(ZoneInfoError::UnknownTimeZone(name.to_string())),
    }
}

#[cfg(feature = "embedded-tzdata")]
static COMPRESSED: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/zoneinfo.zip.gz"));

static INFLATED: OnceLock<Option<Vec<u8>>> = OnceLock::new();

/// The bundled archive, or `None` when it is not compiled in.
pub fn embedded() -> Result<Option<&'static [u8]>> {
    if !cfg!(feature = "embedded-tzdata") {
        return Ok(None);
    }
    INFLATED
        .get_or_init(inflate)
        .as_deref()
        .map(Some)
        .ok_or(ZoneInfoError::CorruptArchive("embedded archive failed to inflate"))
}

#[cfg(feature = "embedded-tzdata")]
fn inflate() -> Option<Vec<u8>> {
    let mut zip = Vec::new();
    GzDecoder::new(COMPRESSED).read_to_end(&mut zip).ok()?;
    Some(zip)
}

#[cfg(not(feature = "embedded-tzdata"))]
fn inflate() -> Option<Vec<u8>> {
    None
}

/// Load `name` from the bundled archive.
pub fn load_embedded(name: &str) -> Result<Location> {
    match embedded()? {
        Some(zip) => load_from_zip(name, zip),
        None => Err(ZoneInfoError::UnknownTimeZone(name.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::testdata::stored_zip;
    use super::*;

    #[test]
    fn test_find_stored_entries() {
        let zip = stored_zip(&[("Europe/Paris", &b"paris"[..]), ("Asia/Tokyo", &b"tokyo"[..])], 0);
        assert_eq!(find(&zip, "Asia/Tokyo").unwrap(), Some(&b"tokyo"[..]));
        assert_eq!(find(&zip, "Europe/Paris").unwrap(), Some(&b"paris"[..]));
        assert_eq!(find(&zip, "Europe/Rome").unwrap(), None);
    }

    #[test]
    fn test_compressed_entries_rejected() {
        let zip = stored_zip(&[("Europe/Paris", &b"paris"[..])], 8);
        assert!(matches!(
            find(&zip, "Europe/Paris"),
            Err(ZoneInfoError::UnsupportedCompression(_))
        ));
    }

    #[test]
    fn test_corrupt_archive() {
        assert!(matches!(find(b"short", "x"), Err(ZoneInfoError::CorruptArchive(_))));
        assert!(matches!(find(&[0u8; 64], "x"), Err(ZoneInfoError::CorruptArchive(_))));

        let mut zip = stored_zip(&[("Europe/Paris", &b"paris"[..])], 0);
        let len = zip.len();
        zip[len - 6] = 0xff;
        assert!(find(&zip, "Europe/Paris").is_err());
    }

    #[test]
    fn test_missing_entry_is_unknown_zone() {
        let zip = stored_zip(&[], 0);
        assert!(matches!(
            load_from_zip("Nowhere/City", &zip),
            Err(ZoneInfoError::UnknownTimeZone(_))
        ));
    }

    #[cfg(feature = "embedded-tzdata")]
    #[test]
    fn test_embedded_archive_has_common_zones() {
        let zip = embedded().unwrap().expect("archive compiled in");
        for name in ["UTC", "America/New_York", "Europe/London", "Australia/Sydney"] {
            assert!(find(zip, name).unwrap().is_some(), "{} missing", name);
        }
    }
}
