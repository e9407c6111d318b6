//! Capability discovery for a freshly opened device.

use log::{error, info, log, warn, Level};

use crate::capability::{Capabilities, Flags, Requirements};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::format::Description;
use crate::fourcc::FourCC;
use crate::frameinterval::FrameIntervalEnum;
use crate::framesize::FrameSizeEnum;

/// What a device reported about itself
///
/// Produced once per open by [`probe`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCapabilities {
    pub caps: Capabilities,
    /// Whether the frame interval can be configured (streaming parameter capability)
    pub time_per_frame: bool,
    /// Advertised pixel formats, only filled in for capture devices
    pub formats: Vec<FormatCapabilities>,
}

impl DeviceCapabilities {
    /// Flags of the opened node
    pub fn flags(&self) -> Flags {
        self.caps.flags()
    }

    /// The requirements this device can fulfill
    pub fn offered(&self) -> Requirements {
        Requirements::offered_by(self.flags(), self.time_per_frame)
    }

    /// Location of the device, e.g. `usb-0000:00:14.0-1`
    pub fn bus_info(&self) -> &str {
        &self.caps.bus
    }

    /// Looks up an advertised pixel format
    pub fn format(&self, fourcc: FourCC) -> Option<&FormatCapabilities> {
        self.formats.iter().find(|f| f.description.fourcc == fourcc)
    }
}

/// An advertised pixel format and the frame sizes it comes in
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCapabilities {
    pub description: Description,
    pub sizes: Vec<SizeCapabilities>,
}

impl FormatCapabilities {
    /// Whether the format is advertised for the given dimensions
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        self.sizes.iter().any(|s| s.size.contains(width, height))
    }
}

/// A frame size with the frame intervals offered for it
///
/// Intervals are only enumerated for discrete sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCapabilities {
    pub size: FrameSizeEnum,
    pub intervals: Vec<FrameIntervalEnum>,
}

/// Queries the capabilities of an open device
///
/// Capture devices additionally get their format / frame size / frame interval tree enumerated.
/// That enumeration is informational: errors in it only shorten the tree.
///
/// # Arguments
///
/// * `driver` - The open device
/// * `name` - Name used in log messages, usually the node path
/// * `mandatory` - Requirements the device has to meet
/// * `verbose` - Log the enumerated tree at info rather than debug level when non-zero
pub fn probe<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    mandatory: Requirements,
    verbose: u8,
) -> Result<DeviceCapabilities> {
    let caps = driver.query_caps().map_err(|e| {
        error!("{}: cannot get capabilities: {}", name, e);
        Error::CapabilityQuery(e)
    })?;
    let flags = caps.flags();

    info!(
        "{}: driver:{} capabilities:{:#x} mandatory:{}",
        name,
        caps.driver,
        u32::from(flags),
        mandatory
    );
    info!("{}: card:{} bus info:{}", name, caps.card, caps.bus);

    // G_PARM is optional for drivers, not answering it just means no frame rate control
    let time_per_frame = driver
        .params()
        .map(|params| params.supports_time_per_frame())
        .unwrap_or(false);

    if flags.contains(Flags::VIDEO_OUTPUT) {
        info!("{} supports output", name);
    }
    let formats = if flags.contains(Flags::VIDEO_CAPTURE) {
        info!("{} supports capture", name);
        enumerate_formats(driver, name, detail_level(verbose))
    } else {
        Vec::new()
    };
    if flags.contains(Flags::READ_WRITE) {
        info!("{} supports read/write", name);
    }
    if flags.contains(Flags::STREAMING) {
        info!("{} supports streaming", name);
    }
    if time_per_frame {
        info!("{} supports timeperframe", name);
    }

    let capabilities = DeviceCapabilities {
        caps,
        time_per_frame,
        formats,
    };

    let offered = capabilities.offered();
    if offered & mandatory != mandatory {
        error!("{}: mandatory capability not available", name);
        return Err(Error::MandatoryCapabilityMissing {
            required: mandatory,
            offered,
        });
    }

    Ok(capabilities)
}

fn detail_level(verbose: u8) -> Level {
    if verbose > 0 {
        Level::Info
    } else {
        Level::Debug
    }
}

fn enumerate_formats<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    level: Level,
) -> Vec<FormatCapabilities> {
    let (descriptions, err) = driver.formats().exhaust();
    if let Some(e) = err {
        warn!("{}: format enumeration stopped early: {}", name, e);
    }

    descriptions
        .into_iter()
        .map(|description| {
            log!(
                level,
                "{}: {}. {} ({}), supported sizes:",
                name,
                description.index + 1,
                description.description,
                description.fourcc
            );
            let sizes = enumerate_sizes(driver, name, description.fourcc, level);
            FormatCapabilities { description, sizes }
        })
        .collect()
}

fn enumerate_sizes<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    fourcc: FourCC,
    level: Level,
) -> Vec<SizeCapabilities> {
    let (sizes, err) = driver.framesizes(fourcc).exhaust();
    if let Some(e) = err {
        warn!("{}: frame size enumeration of {} stopped early: {}", name, fourcc, e);
    }

    sizes
        .into_iter()
        .map(|frame_size| {
            log!(level, "{}:   {}", name, frame_size.size);
            let intervals = match frame_size.size.as_discrete() {
                Some(d) => enumerate_intervals(driver, name, fourcc, d.width, d.height, level),
                None => Vec::new(),
            };
            SizeCapabilities {
                size: frame_size.size,
                intervals,
            }
        })
        .collect()
}

fn enumerate_intervals<D: Driver + ?Sized>(
    driver: &D,
    name: &str,
    fourcc: FourCC,
    width: u32,
    height: u32,
    level: Level,
) -> Vec<FrameIntervalEnum> {
    let (intervals, err) = driver.frameintervals(fourcc, width, height).exhaust();
    if let Some(e) = err {
        warn!(
            "{}: frame interval enumeration of {} {}x{} stopped early: {}",
            name, fourcc, width, height, e
        );
    }

    intervals
        .into_iter()
        .map(|frame_interval| {
            log!(level, "{}:     interval {}", name, frame_interval.interval);
            frame_interval.interval
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimDriver, MJPG, YUYV};

    #[test]
    fn collects_the_format_tree() {
        let driver = SimDriver::camera(YUYV);
        let caps = probe(&driver, "sim", Requirements::CAPTURE, 0).unwrap();

        assert_eq!(caps.bus_info(), "usb-sim-1");
        assert!(caps.time_per_frame);
        assert_eq!(caps.formats.len(), 2);

        let yuyv = caps.format(YUYV).unwrap();
        assert_eq!(yuyv.sizes.len(), 2);
        assert_eq!(yuyv.sizes[0].intervals.len(), 2);
        assert!(yuyv.supports_size(640, 480));
        assert!(!yuyv.supports_size(800, 600));

        // stepwise sizes do not get intervals
        let mjpg = caps.format(MJPG).unwrap();
        assert!(matches!(mjpg.sizes[0].size, FrameSizeEnum::Stepwise(_)));
        assert!(mjpg.sizes[0].intervals.is_empty());
    }

    #[test]
    fn capability_query_failure_is_fatal() {
        let mut driver = SimDriver::camera(YUYV);
        driver.fail_querycap = true;
        let err = probe(&driver, "sim", Requirements::empty(), 0).unwrap_err();
        assert!(matches!(err, Error::CapabilityQuery(_)));
    }

    #[test]
    fn missing_mandatory_capability_is_fatal() {
        let mut driver = SimDriver::camera(YUYV);
        driver.caps.capabilities = Flags::VIDEO_CAPTURE;
        driver.caps.device_caps = Flags::empty();

        let err = probe(&driver, "sim", Requirements::STREAMING, 0).unwrap_err();
        match err {
            Error::MandatoryCapabilityMissing { required, offered } => {
                assert_eq!(required, Requirements::STREAMING);
                assert!(!offered.contains(Requirements::STREAMING));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn enumeration_errors_only_truncate() {
        let mut driver = SimDriver::camera(YUYV);
        driver.framesize_errno = Some(libc::EIO);
        let caps = probe(&driver, "sim", Requirements::CAPTURE, 1).unwrap();

        assert_eq!(caps.formats.len(), 2);
        assert!(caps.formats.iter().all(|f| f.sizes.is_empty()));
    }

    #[test]
    fn unanswered_g_parm_means_no_frame_rate_control() {
        let mut driver = SimDriver::camera(YUYV);
        driver.fail_g_parm = true;

        let caps = probe(&driver, "sim", Requirements::CAPTURE, 0).unwrap();
        assert!(!caps.time_per_frame);
        assert!(!caps.offered().contains(Requirements::TIME_PER_FRAME));

        let err = probe(&driver, "sim", Requirements::TIME_PER_FRAME, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::MandatoryCapabilityMissing { required, .. } if required == Requirements::TIME_PER_FRAME
        ));
    }

    #[test]
    fn time_per_frame_comes_from_stream_capabilities() {
        let mut driver = SimDriver::camera(YUYV);
        driver.stream_caps = crate::parameters::Capabilities::empty();

        let caps = probe(&driver, "sim", Requirements::CAPTURE, 0).unwrap();
        assert!(!caps.time_per_frame);
    }

    #[test]
    fn output_devices_skip_enumeration() {
        let mut driver = SimDriver::camera(YUYV);
        driver.caps.device_caps = Flags::VIDEO_OUTPUT | Flags::STREAMING;
        let caps = probe(&driver, "sim", Requirements::OUTPUT, 0).unwrap();
        assert!(caps.formats.is_empty());
    }
}
