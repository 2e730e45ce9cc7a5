//! # NMEA Protocol Constants and Types
//!
//! Framing bytes and the field layout of the GGA (fix) sentence.

/// Every sentence starts with this byte
pub const SENTENCE_START: u8 = b'$';

/// Sentences end at a line feed (usually preceded by `\r`)
pub const LINE_TERMINATOR: u8 = b'\n';

/// Field separator inside a sentence
pub const FIELD_DELIMITER: char = ',';

/// Separates the sentence body from the optional `*hh` checksum
pub const CHECKSUM_DELIMITER: char = '*';

/// Sentence type carrying latitude/longitude
pub const FIX_SENTENCE_TYPE: &str = "GGA";

/// Identifier length: `$` + talker(2) + type(3)
pub const SENTENCE_ID_LEN: usize = 6;

/// Field positions (0 = sentence identifier, 1 = UTC time)
pub const FIELD_LATITUDE: usize = 2;
pub const FIELD_LATITUDE_HEMISPHERE: usize = 3;
pub const FIELD_LONGITUDE: usize = 4;
pub const FIELD_LONGITUDE_HEMISPHERE: usize = 5;

/// Minutes per degree in `DDMM.MMMM` magnitudes
pub const MINUTES_PER_DEGREE: f64 = 60.0;

/// Hemisphere indicator following a magnitude field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse a latitude indicator (`N`/`S`)
    pub fn latitude(raw: &str) -> Option<Self> {
        match raw {
            "N" => Some(Self::North),
            "S" => Some(Self::South),
            _ => None,
        }
    }

    /// Parse a longitude indicator (`E`/`W`)
    pub fn longitude(raw: &str) -> Option<Self> {
        match raw {
            "E" => Some(Self::East),
            "W" => Some(Self::West),
            _ => None,
        }
    }

    /// Multiplier applied to the unsigned magnitude
    pub fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// Returns true for `$xxGGA` where `xx` is any two-letter talker id
pub fn is_fix_sentence_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == SENTENCE_ID_LEN
        && bytes[0] == SENTENCE_START
        && bytes[1..3].iter().all(u8::is_ascii_uppercase)
        && &id[3..] == FIX_SENTENCE_TYPE
}
