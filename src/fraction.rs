use crate::v4l_sys::*;
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Fraction used for timing settings
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    /// Returns a fraction representation
    ///
    /// # Arguments
    ///
    /// * `num` - Numerator
    /// * `denom` - Denominator
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::Fraction;
    /// let frac = Fraction::new(1, 30);
    /// ```
    pub const fn new(num: u32, denom: u32) -> Self {
        Fraction {
            numerator: num,
            denominator: denom,
        }
    }

    /// Time per frame for a frame rate, i.e. `1/fps`
    pub const fn from_fps(fps: u32) -> Self {
        Fraction::new(1, fps)
    }

    /// Interpreted as a frame interval, the duration in seconds
    pub fn as_secs(&self) -> Option<f64> {
        if self.denominator == 0 {
            return None;
        }
        Some(f64::from(self.numerator) / f64::from(self.denominator))
    }

    /// Interpreted as a frame interval, the matching frame rate
    pub fn as_fps(&self) -> Option<f64> {
        if self.numerator == 0 {
            return None;
        }
        Some(f64::from(self.denominator) / f64::from(self.numerator))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl From<v4l2_fract> for Fraction {
    fn from(frac: v4l2_fract) -> Self {
        Self {
            numerator: frac.numerator,
            denominator: frac.denominator,
        }
    }
}

impl From<Fraction> for v4l2_fract {
    fn from(fraction: Fraction) -> Self {
        Self {
            numerator: fraction.numerator,
            denominator: fraction.denominator,
        }
    }
}
