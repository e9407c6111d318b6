use bitflags::bitflags;
use std::{fmt, mem};

use crate::fraction::Fraction;
use crate::v4l_sys::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Streaming parameter capabilities
    pub struct Capabilities: u32 {
        const TIME_PER_FRAME    = 0x1000;
    }
}

impl From<u32> for Capabilities {
    fn from(caps: u32) -> Self {
        Self::from_bits_retain(caps)
    }
}

impl From<Capabilities> for u32 {
    fn from(capabilities: Capabilities) -> Self {
        capabilities.bits()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modes: u32 {
        const HIGH_QUALITY      = 0x0001;
    }
}

impl From<u32> for Modes {
    fn from(modes: u32) -> Self {
        Self::from_bits_retain(modes)
    }
}

impl From<Modes> for u32 {
    fn from(modes: Modes) -> Self {
        modes.bits()
    }
}

impl fmt::Display for Modes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
/// Streaming parameters
///
/// Output nodes report their mode and write buffer count in the same fields as capture nodes.
pub struct Parameters {
    pub capabilities: Capabilities,
    pub modes: Modes,
    /// Time per frame, in seconds
    pub interval: Fraction,
    /// Number of buffers the driver uses for read() (or write()) I/O
    pub read_buffers: u32,
}

impl Parameters {
    pub fn new(interval: Fraction) -> Self {
        Parameters {
            interval,
            ..Default::default()
        }
    }

    /// Parameters asking for the given frame rate
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::{Fraction, Parameters};
    /// let params = Parameters::with_fps(30);
    /// assert_eq!(params.interval, Fraction::new(1, 30));
    /// ```
    pub fn with_fps(fps: u32) -> Self {
        Parameters::new(Fraction::from_fps(fps))
    }

    /// Whether the driver allows changing the frame interval
    pub fn supports_time_per_frame(&self) -> bool {
        self.capabilities.contains(Capabilities::TIME_PER_FRAME)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "capabilities : {}", self.capabilities)?;
        writeln!(f, "modes        : {}", self.modes)?;
        writeln!(f, "interval     : {} [s]", self.interval)?;
        writeln!(f, "read buffers : {}", self.read_buffers)?;
        Ok(())
    }
}

impl From<v4l2_captureparm> for Parameters {
    fn from(params: v4l2_captureparm) -> Self {
        Self {
            capabilities: Capabilities::from(params.capability),
            modes: Modes::from(params.capturemode),
            interval: Fraction::from(params.timeperframe),
            read_buffers: params.readbuffers,
        }
    }
}

impl From<Parameters> for v4l2_captureparm {
    fn from(parameters: Parameters) -> Self {
        Self {
            capability: parameters.capabilities.into(),
            capturemode: parameters.modes.into(),
            timeperframe: parameters.interval.into(),
            readbuffers: parameters.read_buffers,
            ..unsafe { mem::zeroed() }
        }
    }
}

impl From<v4l2_outputparm> for Parameters {
    fn from(params: v4l2_outputparm) -> Self {
        Self {
            capabilities: Capabilities::from(params.capability),
            modes: Modes::from(params.outputmode),
            interval: Fraction::from(params.timeperframe),
            read_buffers: params.writebuffers,
        }
    }
}

impl From<Parameters> for v4l2_outputparm {
    fn from(parameters: Parameters) -> Self {
        Self {
            capability: parameters.capabilities.into(),
            outputmode: parameters.modes.into(),
            timeperframe: parameters.interval.into(),
            writebuffers: parameters.read_buffers,
            ..unsafe { mem::zeroed() }
        }
    }
}
