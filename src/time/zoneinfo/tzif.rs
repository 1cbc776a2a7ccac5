//! TZif file parsing (RFC 8536)
//!
//! Version 1 files are read from their 32-bit data block. For version 2 and
//! later the 32-bit block is skipped and the 64-bit block is used instead,
//! followed by the POSIX TZ footer. Leap second records are read and dropped.

use super::{Location, Zone, ZoneInfoError, ZoneTransition};

const MAGIC: &[u8; 4] = b"TZif";
const HEADER_RESERVED: usize = 15;
const ZONE_RECORD_LEN: usize = 6;

/// Upper bound on the size of a zoneinfo file read from disk.
pub const MAX_FILE_SIZE: u64 = 10 << 20;

type Result<T> = std::result::Result<T, ZoneInfoError>;

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(ZoneInfoError::BadData("unexpected end of data"));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn be_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&self) -> &'a [u8] {
        self.data
    }
}

/// Record counts from a TZif header, in on-disk order.
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    utc_indicators: usize,
    std_indicators: usize,
    leaps: usize,
    transitions: usize,
    zones: usize,
    chars: usize,
}

impl Counts {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            utc_indicators: reader.be_u32()? as usize,
            std_indicators: reader.be_u32()? as usize,
            leaps: reader.be_u32()? as usize,
            transitions: reader.be_u32()? as usize,
            zones: reader.be_u32()? as usize,
            chars: reader.be_u32()? as usize,
        })
    }

    /// Size of the data block that follows a header with these counts.
    fn block_len(&self, time_size: usize) -> usize {
        self.transitions
            .saturating_mul(time_size)
            .saturating_add(self.transitions)
            .saturating_add(self.zones.saturating_mul(ZONE_RECORD_LEN))
            .saturating_add(self.chars)
            .saturating_add(self.leaps.saturating_mul(time_size + 4))
            .saturating_add(self.std_indicators)
            .saturating_add(self.utc_indicators)
    }
}

/// Parse TZif `data` into a location called `name`.
pub fn parse(name: &str, data: &[u8]) -> Result<Location> {
    let mut reader = Reader { data };

    if reader.take(MAGIC.len())? != MAGIC {
        return Err(ZoneInfoError::BadData("missing TZif magic"));
    }

    let version = reader.byte()?;
    if !matches!(version, 0 | b'2' | b'3' | b'4') {
        return Err(ZoneInfoError::BadData("unsupported TZif version"));
    }
    reader.take(HEADER_RESERVED)?;

    let mut counts = Counts::read(&mut reader)?;
    let mut time_size = 4;

    if version != 0 {
        // Skip the v1 data block and its v1 footer-less header, then read
        // the 64-bit header.
        reader.take(counts.block_len(4))?;
        reader.take(MAGIC.len() + 1 + HEADER_RESERVED)?;
        counts = Counts::read(&mut reader)?;
        time_size = 8;
    }

    let times = reader.take(counts.transitions.saturating_mul(time_size))?;
    let indices = reader.take(counts.transitions)?;
    let zone_data = reader.take(counts.zones.saturating_mul(ZONE_RECORD_LEN))?;
    let chars = reader.take(counts.chars)?;
    reader.take(counts.leaps.saturating_mul(time_size + 4))?;
    let std_flags = reader.take(counts.std_indicators)?;
    let utc_flags = reader.take(counts.utc_indicators)?;

    if counts.zones == 0 {
        return Err(ZoneInfoError::BadData("no local time types"));
    }

    let zones = zone_data
        .chunks_exact(ZONE_RECORD_LEN)
        .map(|record| parse_zone(record, chars))
        .collect::<Result<Vec<_>>>()?;

    let mut transitions = Vec::with_capacity(counts.transitions);
    for (i, when) in times.chunks_exact(time_size).enumerate() {
        let zone_index = usize::from(indices[i]);
        if zone_index >= zones.len() {
            return Err(ZoneInfoError::BadData("transition refers to a missing zone"));
        }

        let when = match *when {
            [a, b, c, d] => i64::from(i32::from_be_bytes([a, b, c, d])),
            [a, b, c, d, e, f, g, h] => i64::from_be_bytes([a, b, c, d, e, f, g, h]),
            _ => return Err(ZoneInfoError::BadData("bad transition time")),
        };

        transitions.push(ZoneTransition {
            when,
            zone_index,
            is_std: std_flags.get(i).is_some_and(|&flag| flag != 0),
            is_utc: utc_flags.get(i).is_some_and(|&flag| flag != 0),
        });
    }

    if transitions.windows(2).any(|pair| pair[0].when >= pair[1].when) {
        return Err(ZoneInfoError::BadData("transitions out of order"));
    }

    let extend = if time_size == 8 {
        parse_footer(reader.rest())
    } else {
        String::new()
    };

    Ok(Location::from_parts(name, zones, transitions, extend))
}

fn parse_zone(record: &[u8], chars: &[u8]) -> Result<Zone> {
    let offset_seconds = i32::from_be_bytes([record[0], record[1], record[2], record[3]]);
    let is_dst = record[4] != 0;
    let abbreviation = usize::from(record[5]);
    if abbreviation >= chars.len() {
        return Err(ZoneInfoError::BadData("abbreviation index out of range"));
    }

    let tail = &chars[abbreviation..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());

    Ok(Zone {
        name: String::from_utf8_lossy(&tail[..end]).into_owned(),
        offset_seconds,
        is_dst,
    })
}

/// The POSIX TZ string between the newlines that follow the v2+ data block.
fn parse_footer(rest: &[u8]) -> String {
    match rest {
        [b'\n', body @ .., b'\n'] if !body.is_empty() => String::from_utf8_lossy(body).into_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    //! Hand-assembled TZif images.

    pub struct Image {
        pub zones: Vec<(i32, bool, &'static str)>,
        pub transitions: Vec<(i64, u8)>,
        pub footer: &'static str,
    }

    fn header(out: &mut Vec<u8>, version: u8, image: &Image, chars: usize) {
        out.extend_from_slice(b"TZif");
        out.push(version);
        out.extend_from_slice(&[0; 15]);
        let n = image.transitions.len() as u32;
        for count in [n, n, 0, n, image.zones.len() as u32, chars as u32] {
            out.extend_from_slice(&count.to_be_bytes());
        }
    }

    fn block(out: &mut Vec<u8>, image: &Image, chars: &[u8], wide: bool) {
        for &(when, _) in &image.transitions {
            if wide {
                out.extend_from_slice(&when.to_be_bytes());
            } else {
                out.extend_from_slice(&(when as i32).to_be_bytes());
            }
        }
        for &(_, index) in &image.transitions {
            out.push(index);
        }
        let mut position = 0u8;
        for &(offset, dst, name) in &image.zones {
            out.extend_from_slice(&offset.to_be_bytes());
            out.push(u8::from(dst));
            out.push(position);
            position += name.len() as u8 + 1;
        }
        out.extend_from_slice(chars);
        out.extend(std::iter::repeat(0).take(image.transitions.len() * 2));
    }

    impl Image {
        fn chars(&self) -> Vec<u8> {
            let mut chars = Vec::new();
            for &(_, _, name) in &self.zones {
                chars.extend_from_slice(name.as_bytes());
                chars.push(0);
            }
            chars
        }

        pub fn v1(&self) -> Vec<u8> {
            let chars = self.chars();
            let mut out = Vec::new();
            header(&mut out, 0, self, chars.len());
            block(&mut out, self, &chars, false);
            out
        }

        pub fn v2(&self) -> Vec<u8> {
            let chars = self.chars();
            let mut out = Vec::new();
            header(&mut out, b'2', self, chars.len());
            block(&mut out, self, &chars, false);
            header(&mut out, b'2', self, chars.len());
            block(&mut out, self, &chars, true);
            out.push(b'\n');
            out.extend_from_slice(self.footer.as_bytes());
            out.push(b'\n');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::Image;
    use super::*;

    fn new_york_like() -> Image {
        Image {
            zones: vec![(-17762, false, "LMT"), (-14400, true, "EDT"), (-18000, false, "EST")],
            // 1883-11-18 17:00 UTC, then the 2007 spring and autumn changes
            transitions: vec![(-2_717_650_800, 2), (1_173_596_400, 1), (1_194_156_000, 2)],
            footer: "EST5EDT,M3.2.0,M11.1.0",
        }
    }

    #[test]
    fn test_parse_v2_uses_wide_block_and_footer() {
        let location = parse("America/New_York", &new_york_like().v2()).unwrap();

        assert_eq!(location.name(), "America/New_York");
        assert_eq!(location.zones().len(), 3);
        assert_eq!(location.zones()[1].name, "EDT");
        assert_eq!(location.transitions()[0].when, -2_717_650_800);
        assert_eq!(location.transitions()[0].zone_index, 2);
        assert_eq!(location.extend(), "EST5EDT,M3.2.0,M11.1.0");
    }

    #[test]
    fn test_parse_v1_has_no_footer() {
        let image = Image {
            zones: vec![(3600, false, "CET"), (7200, true, "CEST")],
            transitions: vec![(100, 1), (200, 0)],
            footer: "",
        };
        let location = parse("Test/V1", &image.v1()).unwrap();
        assert_eq!(location.extend(), "");
        assert_eq!(location.lookup(150).name, "CEST");
        assert_eq!(location.lookup(250).offset, 3600);
    }

    #[test]
    fn test_lookup_after_last_transition_follows_footer() {
        let location = parse("America/New_York", &new_york_like().v2()).unwrap();

        // 2023-07-01T00:00:00Z and 2023-01-15T00:00:00Z
        assert_eq!(location.lookup(1_688_169_600).offset, -14400);
        assert_eq!(location.lookup(1_673_740_800).offset, -18000);
        // 2007-06-01T00:00:00Z, between explicit transitions
        let found = location.lookup(1_180_656_000);
        assert_eq!((found.name, found.start, found.end), ("EDT", 1_173_596_400, 1_194_156_000));
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        let mut data = new_york_like().v2();
        data[0] = b'X';
        assert!(matches!(parse("x", &data), Err(ZoneInfoError::BadData(_))));

        let mut data = new_york_like().v2();
        data[4] = b'9';
        assert!(matches!(parse("x", &data), Err(ZoneInfoError::BadData(_))));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let data = new_york_like().v2();
        for len in [0, 3, 20, 44, 60, data.len() / 2] {
            assert!(parse("x", &data[..len]).is_err(), "length {}", len);
        }
    }

    #[test]
    fn test_rejects_out_of_range_zone_index() {
        let image = Image {
            zones: vec![(0, false, "UTC")],
            transitions: vec![(100, 1)],
            footer: "",
        };
        assert!(matches!(parse("x", &image.v1()), Err(ZoneInfoError::BadData(_))));
    }

    #[test]
    fn test_rejects_empty_zone_table() {
        let image = Image {
            zones: vec![],
            transitions: vec![],
            footer: "",
        };
        assert!(matches!(parse("x", &image.v1()), Err(ZoneInfoError::BadData(_))));
    }

    #[test]
    fn test_footer_requires_both_newlines() {
        assert_eq!(parse_footer(b"\nUTC0\n"), "UTC0");
        assert_eq!(parse_footer(b"\nUTC0"), "");
        assert_eq!(parse_footer(b"\n\n"), "");
        assert_eq!(parse_footer(b""), "");
    }
}
