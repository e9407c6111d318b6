//! Pixel format and frame size negotiation.

use std::fmt;

use log::{info, warn};

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::fourcc::FourCC;

/// The format a driver actually granted
///
/// Always taken from a driver answer, never from the request, so buffers must be sized from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NegotiatedFormat {
    pub fourcc: FourCC,
    pub width: u32,
    pub height: u32,
    /// Maximum number of bytes per frame
    pub buffer_size: u32,
}

impl From<Format> for NegotiatedFormat {
    fn from(fmt: Format) -> Self {
        NegotiatedFormat {
            fourcc: fmt.fourcc,
            width: fmt.width,
            height: fmt.height,
            buffer_size: fmt.size,
        }
    }
}

impl fmt::Display for NegotiatedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} size:{}x{} bufferSize:{}",
            self.fourcc, self.width, self.height, self.buffer_size
        )
    }
}

/// Reads the current format
///
/// Best effort: a failing `VIDIOC_G_FMT` is logged and yields `None`.
pub fn query_format<D: Driver + ?Sized>(driver: &D, name: &str) -> Option<NegotiatedFormat> {
    match driver.format() {
        Ok(fmt) => {
            let current = NegotiatedFormat::from(fmt);
            info!("{}: {}", name, current);
            Some(current)
        }
        Err(e) => {
            warn!("{}: cannot get format: {}", name, e);
            None
        }
    }
}

/// Negotiates a pixel format and frame size
///
/// A zero `width` or `height` keeps what the driver currently uses, and an empty candidate list
/// stands for the driver's current pixel format. Candidates are tried in order until the driver
/// grants one; a driver substituting a different pixel format counts as a refusal, a driver
/// adjusting the frame size does not.
///
/// # Arguments
///
/// * `driver` - The open device
/// * `name` - Name used in log messages
/// * `candidates` - Acceptable pixel formats, most preferred first
/// * `width` - Requested width in pixels, 0 for the current one
/// * `height` - Requested height in pixels, 0 for the current one
pub fn negotiate<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    candidates: &[FourCC],
    width: u32,
    height: u32,
) -> Result<NegotiatedFormat> {
    let current = query_format(driver, name);

    let width = match (width, current) {
        (0, Some(current)) => current.width,
        _ => width,
    };
    let height = match (height, current) {
        (0, Some(current)) => current.height,
        _ => height,
    };

    let mut candidates = candidates.to_vec();
    if candidates.is_empty() {
        if let Some(current) = current.filter(|c| !c.fourcc.is_empty()) {
            candidates.push(current.fourcc);
        }
    }

    for &fourcc in &candidates {
        if let Some(granted) = try_format(driver, name, fourcc, width, height) {
            // the S_FMT answer carries a bogus size with some drivers (v4l2loopback), a fresh
            // G_FMT does not
            return Ok(query_format(driver, name).unwrap_or(granted));
        }
    }

    Err(Error::NoFormatAccepted { tried: candidates })
}

fn try_format<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    fourcc: FourCC,
    width: u32,
    height: u32,
) -> Option<NegotiatedFormat> {
    let granted = match driver.set_format(&Format::new(width, height, fourcc)) {
        Ok(fmt) => fmt,
        Err(e) => {
            warn!("{}: cannot set format {}: {}", name, fourcc, e);
            return None;
        }
    };

    if granted.fourcc != fourcc {
        warn!(
            "{}: cannot set pixelformat to {}, format is {}",
            name, fourcc, granted.fourcc
        );
        return None;
    }
    if granted.width != width || granted.height != height {
        warn!(
            "{}: cannot set size to {}x{}, size is {}x{}",
            name, width, height, granted.width, granted.height
        );
    }

    let granted = NegotiatedFormat::from(granted);
    info!("{}: setting {}", name, granted);
    Some(granted)
}
