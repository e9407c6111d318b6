use std::convert::TryFrom;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
/// How the lines of a frame are distributed over fields
///
/// Negotiation always asks for [`FieldOrder::Any`] and reports what the driver picked.
pub enum FieldOrder {
    #[default]
    Any = 0,
    Progressive = 1,
    Top = 2,
    Bottom = 3,
    Interlaced = 4,
    SequentialTB = 5,
    SequentialBT = 6,
    Alternate = 7,
    InterlacedTB = 8,
    InterlacedBT = 9,
}

impl FieldOrder {
    pub fn is_interlaced(&self) -> bool {
        !matches!(self, Self::Any | Self::Progressive)
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Progressive => "progressive",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Interlaced => "interlaced",
            Self::SequentialTB => "sequential, top then bottom",
            Self::SequentialBT => "sequential, bottom then top",
            Self::Alternate => "alternate between fields",
            Self::InterlacedTB => "interlaced, starting with top",
            Self::InterlacedBT => "interlaced, starting with bottom",
        };
        f.write_str(name)
    }
}

impl TryFrom<u32> for FieldOrder {
    /// The unrecognized raw value
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Any,
            1 => Self::Progressive,
            2 => Self::Top,
            3 => Self::Bottom,
            4 => Self::Interlaced,
            5 => Self::SequentialTB,
            6 => Self::SequentialBT,
            7 => Self::Alternate,
            8 => Self::InterlacedTB,
            9 => Self::InterlacedBT,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FieldOrder;
    use std::convert::TryFrom;

    #[test]
    fn raw_values_map_back() {
        assert_eq!(FieldOrder::try_from(FieldOrder::Alternate as u32), Ok(FieldOrder::Alternate));
        assert_eq!(FieldOrder::try_from(42), Err(42));
        assert!(!FieldOrder::Progressive.is_interlaced());
        assert!(FieldOrder::InterlacedBT.is_interlaced());
    }
}
