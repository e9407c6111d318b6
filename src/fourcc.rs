use std::{fmt, str};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
/// Four character code representing a pixelformat
pub struct FourCC {
    pub repr: [u8; 4],
}

impl FourCC {
    #[allow(clippy::trivially_copy_pass_by_ref)]
    /// Returns a pixelformat as four character code
    ///
    /// # Arguments
    ///
    /// * `repr` - Four characters as raw bytes
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// ```
    pub const fn new(repr: &[u8; 4]) -> FourCC {
        FourCC { repr: *repr }
    }

    /// Returns the human readable form of a raw pixelformat code
    ///
    /// The four bytes are taken in little endian order and trailing zero bytes are dropped, so
    /// the result may be shorter than four characters. Each byte maps to the character with the
    /// same code point, which makes this total: every code has a representation.
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::FourCC;
    /// assert_eq!(FourCC::encode(0x5659_5559), "YUYV");
    /// assert_eq!(FourCC::encode(0x0000_3842), "B8");
    /// ```
    pub fn encode(code: u32) -> String {
        FourCC::from(code).to_string()
    }

    /// Whether this is the zero code, which drivers use for "no format"
    pub fn is_empty(&self) -> bool {
        self.repr == [0; 4]
    }

    /// Returns the bytes of the code without trailing zero padding
    pub fn trimmed(&self) -> &[u8] {
        let len = self.repr.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.repr[..len]
    }

    /// Returns the string representation of a four character code
    ///
    /// Fails for codes which are not valid UTF-8, use the [`fmt::Display`] implementation for a
    /// representation that always exists.
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// let str = fourcc.str().unwrap();
    /// ```
    pub fn str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(self.trimmed())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string: String = self.trimmed().iter().map(|&b| char::from(b)).collect();
        f.pad(&string)
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC::new(&code.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        Self::from_le_bytes(fourcc.repr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Reasons a string cannot be turned into a [`FourCC`]
pub enum ParseFourCCError {
    #[error("four character code {0:?} is longer than four characters")]
    TooLong(String),
    #[error("four character code {0:?} contains a character outside of U+0000..=U+00FF")]
    InvalidChar(String),
}

impl str::FromStr for FourCC {
    type Err = ParseFourCCError;

    /// Parses the textual form produced by [`FourCC::encode`]
    ///
    /// Shorter strings are padded with zero bytes on the right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut repr = [0u8; 4];
        let mut len = 0;

        for c in s.chars() {
            if len == repr.len() {
                return Err(ParseFourCCError::TooLong(s.to_string()));
            }
            repr[len] = u8::try_from(u32::from(c))
                .map_err(|_| ParseFourCCError::InvalidChar(s.to_string()))?;
            len += 1;
        }

        Ok(FourCC { repr })
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
