use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::{fmt, io, time};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::buffer::Type;
use crate::capability::Requirements;
use crate::configure::configure_fps;
use crate::driver::{Driver, Handle};
use crate::error::{Error, Result};
use crate::fourcc::FourCC;
use crate::negotiate::{negotiate, query_format, NegotiatedFormat};
use crate::parameters::Parameters;
use crate::probe::{probe, DeviceCapabilities};
use crate::pselect;
use crate::select::{select_input, SelectedInput};

/// What to open and what to ask of it
///
/// Deserializable, so it can live in a configuration file. Omitted fields take their defaults:
///
/// ```
/// use v4l_negotiate::DeviceParameters;
///
/// let params: DeviceParameters =
///     serde_json::from_str(r#"{ "path": "/dev/video2", "formats": ["MJPG", "YUYV"], "fps": 30 }"#)
///         .unwrap();
/// assert_eq!(params.width, 0);
/// assert_eq!(params.input, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParameters {
    /// Device node, or a plain file to write to
    pub path: PathBuf,
    /// Flags for open(2)
    pub open_flags: i32,
    /// Acceptable pixel formats, most preferred first; empty for the driver's current one
    pub formats: Vec<FourCC>,
    /// Requested width, 0 for the driver's current one
    pub width: u32,
    /// Requested height, 0 for the driver's current one
    pub height: u32,
    /// Requested frame rate, 0 to leave it alone
    pub fps: u32,
    /// Video input to select
    pub input: u32,
    /// Capture or output
    pub buffer_type: Type,
    /// Log the capability tree at info level when non-zero
    pub verbose: u8,
}

impl Default for DeviceParameters {
    fn default() -> Self {
        DeviceParameters {
            path: PathBuf::from("/dev/video0"),
            open_flags: libc::O_RDWR | libc::O_NONBLOCK,
            formats: Vec::new(),
            width: 0,
            height: 0,
            fps: 0,
            input: 0,
            buffer_type: Type::VideoCapture,
            verbose: 0,
        }
    }
}

impl DeviceParameters {
    /// Parameters for `path` that keep whatever the driver is currently set to
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        DeviceParameters {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_formats<I: IntoIterator<Item = FourCC>>(mut self, formats: I) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_input(mut self, input: u32) -> Self {
        self.input = input;
        self
    }

    pub fn with_open_flags(mut self, flags: i32) -> Self {
        self.open_flags = flags;
        self
    }

    pub fn with_buffer_type(mut self, typ: Type) -> Self {
        self.buffer_type = typ;
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lifecycle of a [`Device`]
///
/// States only exist once there is a node to initialize: `Opening` and `Configuring` are passed
/// while [`Device::with_driver`] (or [`Device::open`], after the node opened) runs, and a failed
/// initialization goes through `Failed` back to `Closed` before the error is returned. A node that
/// cannot be opened at all is reported as [`Error::Open`] without any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    Opening,
    Configuring,
    Ready,
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

enum Node<D> {
    Video(D),
    /// Plain file written to instead of a video node
    Sink(File),
}

/// Everything negotiated during initialization
struct Negotiated {
    capabilities: DeviceCapabilities,
    input: SelectedInput,
    format: NegotiatedFormat,
    stream_parameters: Option<Parameters>,
}

/// A negotiated video device
///
/// Owns the open node. Downstream buffer and capture code reads the granted format from here
/// (never from the [`DeviceParameters`] it asked for) and uses [`Device::fd`] for I/O.
pub struct Device<D: Driver = Handle> {
    params: DeviceParameters,
    node: Option<Node<D>>,
    state: State,
    capabilities: Option<DeviceCapabilities>,
    input: Option<SelectedInput>,
    format: Option<NegotiatedFormat>,
    stream_parameters: Option<Parameters>,
}

impl Device<Handle> {
    /// Opens and negotiates a device
    ///
    /// Character devices are probed, get their input selected, a format negotiated and the
    /// frame rate configured. Anything else is opened as a write-only sink file, created or
    /// truncated as needed, without any negotiation (used for loopback style targets).
    ///
    /// # Arguments
    ///
    /// * `params` - What to open and what to ask for
    /// * `mandatory` - Capabilities the device must have
    ///
    /// # Example
    ///
    /// ```no_run
    /// use v4l_negotiate::{Device, DeviceParameters, FourCC, Requirements};
    ///
    /// let params = DeviceParameters::new("/dev/video0")
    ///     .with_formats([FourCC::new(b"MJPG"), FourCC::new(b"YUYV")])
    ///     .with_size(1280, 720)
    ///     .with_fps(30);
    /// let dev = Device::open(params, Requirements::CAPTURE | Requirements::STREAMING).unwrap();
    /// println!("{}x{} {}", dev.width(), dev.height(), dev.fourcc());
    /// ```
    pub fn open(params: DeviceParameters, mandatory: Requirements) -> Result<Self> {
        let path = params.path.clone();

        if !is_char_device(&path) {
            return Self::open_sink(params);
        }

        debug!("{}: opening video node", path.display());
        let handle = Handle::open(&path, params.open_flags, params.buffer_type).map_err(|e| {
            error!("cannot open device {}: {}", path.display(), e);
            Error::Open { path, source: e }
        })?;

        Self::with_driver(handle, params, mandatory)
    }

    fn open_sink(params: DeviceParameters) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o700)
            .open(&params.path)
            .map_err(|e| {
                error!("cannot open sink {}: {}", params.path.display(), e);
                Error::Open {
                    path: params.path.clone(),
                    source: e,
                }
            })?;

        info!("{}: not a video node, writing to it as a file", params.name());
        let mut device = Device::closed(params);
        device.node = Some(Node::Sink(file));
        device.state = State::Ready;
        Ok(device)
    }
}

impl<D: Driver> Device<D> {
    /// Negotiates over an already open driver
    ///
    /// Runs the same sequence as [`Device::open`] does for character devices. On failure the
    /// driver is dropped before the error is returned.
    pub fn with_driver(driver: D, params: DeviceParameters, mandatory: Requirements) -> Result<Self> {
        let mut device = Device::closed(params);
        device.transition(State::Opening);
        device.transition(State::Configuring);

        match initialize(&driver, &device.params, mandatory) {
            Ok(negotiated) => {
                device.node = Some(Node::Video(driver));
                device.capabilities = Some(negotiated.capabilities);
                device.input = Some(negotiated.input);
                device.format = Some(negotiated.format);
                device.stream_parameters = negotiated.stream_parameters;
                device.transition(State::Ready);
                Ok(device)
            }
            Err(e) => {
                error!("cannot init device {}: {}", device.params.name(), e);
                device.transition(State::Failed);
                drop(driver);
                device.transition(State::Closed);
                Err(e)
            }
        }
    }

    fn closed(params: DeviceParameters) -> Self {
        Device {
            params,
            node: None,
            state: State::Closed,
            capabilities: None,
            input: None,
            format: None,
            stream_parameters: None,
        }
    }

    fn transition(&mut self, next: State) {
        debug!("{}: {} -> {}", self.params.name(), self.state, next);
        self.state = next;
    }

    /// Closes the node
    ///
    /// Safe to call any number of times. Negotiated state is discarded along with the node.
    pub fn close(&mut self) {
        if self.node.take().is_some() {
            self.transition(State::Closed);
        }
        self.state = State::Closed;
        self.capabilities = None;
        self.input = None;
        self.format = None;
        self.stream_parameters = None;
    }

    /// Refreshes the format from the driver
    ///
    /// Best effort: if the driver cannot be asked, the previous format is kept. Returns the
    /// format as known afterwards.
    pub fn query_format(&mut self) -> Option<NegotiatedFormat> {
        if let Some(Node::Video(driver)) = &self.node {
            if let Some(current) = query_format(driver, &self.params.name()) {
                self.format = Some(current);
            }
        }
        self.format
    }

    /// Blocks until a frame can be read or the timeout passes
    pub fn is_readable(&self, timeout: Option<time::Duration>) -> io::Result<bool> {
        match self.fd() {
            Some(fd) => pselect::wait_readable(fd, timeout),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "device has no open descriptor",
            )),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.node.is_some()
    }

    /// Whether the path was opened as a plain file rather than a video node
    pub fn is_sink(&self) -> bool {
        matches!(self.node, Some(Node::Sink(_)))
    }

    /// The descriptor downstream I/O should use
    pub fn fd(&self) -> Option<RawFd> {
        match &self.node {
            Some(Node::Video(driver)) => driver.raw_fd(),
            Some(Node::Sink(file)) => Some(file.as_raw_fd()),
            None => None,
        }
    }

    /// The driver, for requests this crate does not cover
    pub fn driver(&self) -> Option<&D> {
        match &self.node {
            Some(Node::Video(driver)) => Some(driver),
            _ => None,
        }
    }

    /// The parameters as requested
    ///
    /// These are never updated with what negotiation settled on. In particular an empty format
    /// list stays empty even though the driver's current format was tried; see [`Device::format`]
    /// for the granted one.
    pub fn params(&self) -> &DeviceParameters {
        &self.params
    }

    pub fn capabilities(&self) -> Option<&DeviceCapabilities> {
        self.capabilities.as_ref()
    }

    pub fn input(&self) -> Option<&SelectedInput> {
        self.input.as_ref()
    }

    /// Streaming parameters granted for the requested frame rate
    pub fn stream_parameters(&self) -> Option<&Parameters> {
        self.stream_parameters.as_ref()
    }

    /// The granted format
    pub fn format(&self) -> Option<NegotiatedFormat> {
        self.format
    }

    pub fn bus_info(&self) -> Option<&str> {
        self.capabilities.as_ref().map(DeviceCapabilities::bus_info)
    }

    pub fn fourcc(&self) -> FourCC {
        self.format.map(|f| f.fourcc).unwrap_or_default()
    }

    pub fn width(&self) -> u32 {
        self.format.map_or(0, |f| f.width)
    }

    pub fn height(&self) -> u32 {
        self.format.map_or(0, |f| f.height)
    }

    pub fn buffer_size(&self) -> u32 {
        self.format.map_or(0, |f| f.buffer_size)
    }
}

impl<D: Driver> fmt::Debug for Device<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("path", &self.params.path)
            .field("state", &self.state)
            .field("sink", &self.is_sink())
            .field("format", &self.format)
            .finish()
    }
}

fn is_char_device(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.file_type().is_char_device())
        .unwrap_or(false)
}

fn initialize<D: Driver + ?Sized>(
    driver: &D,
    params: &DeviceParameters,
    mandatory: Requirements,
) -> Result<Negotiated> {
    let name = params.name();

    let capabilities = probe(driver, &name, mandatory, params.verbose)?;
    let input = select_input(driver, &name, params.input)?;
    let format = negotiate(driver, &name, &params.formats, params.width, params.height)?;
    let stream_parameters = configure_fps(driver, &name, params.fps);

    Ok(Negotiated {
        capabilities,
        input,
        format,
        stream_parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Flags;
    use crate::fraction::Fraction;
    use crate::sim::{SimDriver, GREY, MJPG, YUYV};

    fn params() -> DeviceParameters {
        DeviceParameters::new("/dev/sim0")
    }

    #[test]
    fn end_to_end_with_driver_defaults() {
        let driver = SimDriver::camera(YUYV);
        let params = params().with_size(640, 480).with_fps(120);

        let dev = Device::with_driver(driver, params, Requirements::CAPTURE).unwrap();

        assert_eq!(dev.state(), State::Ready);
        assert_eq!(
            dev.format(),
            Some(NegotiatedFormat {
                fourcc: YUYV,
                width: 640,
                height: 480,
                buffer_size: 640 * 480 * 2,
            })
        );
        assert_eq!(dev.bus_info(), Some("usb-sim-1"));
        assert_eq!(
            dev.stream_parameters().map(|p| p.interval),
            Some(Fraction::new(1, 120))
        );
        assert!(!dev.is_sink());
    }

    #[test]
    fn missing_streaming_closes_the_driver() {
        let mut driver = SimDriver::camera(YUYV);
        driver.caps.capabilities = Flags::VIDEO_CAPTURE;
        driver.caps.device_caps = Flags::empty();
        let closed = driver.dropped.clone();

        let err = Device::with_driver(driver, params(), Requirements::STREAMING).unwrap_err();

        assert!(matches!(err, Error::MandatoryCapabilityMissing { .. }));
        assert!(closed.get());
    }

    #[test]
    fn missing_frame_rate_control_closes_the_driver() {
        let mut driver = SimDriver::camera(YUYV);
        driver.fail_g_parm = true;
        let closed = driver.dropped.clone();

        let err = Device::with_driver(
            driver,
            params().with_fps(30),
            Requirements::CAPTURE | Requirements::TIME_PER_FRAME,
        )
        .unwrap_err();

        match err {
            Error::MandatoryCapabilityMissing { required, offered } => {
                assert!(required.contains(Requirements::TIME_PER_FRAME));
                assert!(!offered.contains(Requirements::TIME_PER_FRAME));
                assert!(offered.contains(Requirements::CAPTURE));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(closed.get());
    }

    #[test]
    fn open_succeeds_iff_mandatory_flags_are_present() {
        let device_flags = [
            Flags::VIDEO_CAPTURE,
            Flags::VIDEO_CAPTURE | Flags::STREAMING,
            Flags::VIDEO_CAPTURE | Flags::READ_WRITE | Flags::STREAMING,
            Flags::VIDEO_OUTPUT | Flags::STREAMING,
        ];

        for flags in device_flags {
            for bits in 0..=Requirements::all().bits() {
                let mandatory = Requirements::from_bits_truncate(bits);
                let mut driver = SimDriver::camera(YUYV);
                driver.caps.device_caps = flags;
                let offered = Requirements::offered_by(flags, true);

                let result = Device::with_driver(driver, params(), mandatory);
                assert_eq!(
                    result.is_ok(),
                    offered & mandatory == mandatory,
                    "flags {} mandatory {}",
                    flags,
                    mandatory
                );
            }
        }
    }

    #[test]
    fn fatal_steps_abort_in_order() {
        let mut driver = SimDriver::camera(YUYV);
        driver.accepts = vec![];
        let closed = driver.dropped.clone();
        let err = Device::with_driver(driver, params().with_formats([GREY]), Requirements::empty())
            .unwrap_err();
        assert!(matches!(err, Error::NoFormatAccepted { .. }));
        assert!(closed.get());

        let driver = SimDriver::capture_card();
        let err = Device::with_driver(driver, params().with_input(9), Requirements::empty())
            .unwrap_err();
        assert!(matches!(err, Error::InputSelection { index: 9, .. }));
    }

    #[test]
    fn rejected_fps_keeps_device_usable() {
        let mut driver = SimDriver::camera(MJPG);
        driver.reject_fps = true;

        let dev = Device::with_driver(driver, params().with_fps(60), Requirements::CAPTURE).unwrap();

        assert_eq!(dev.state(), State::Ready);
        assert_eq!(dev.fourcc(), MJPG);
        assert!(dev.stream_parameters().is_none());
    }

    #[test]
    fn query_format_keeps_state_on_failure() {
        let driver = SimDriver::camera(YUYV);
        let mut dev = Device::with_driver(driver, params(), Requirements::empty()).unwrap();
        let before = dev.format();

        dev.driver().unwrap().fail_g_fmt.set(true);
        assert_eq!(dev.query_format(), before);

        dev.driver().unwrap().fail_g_fmt.set(false);
        dev.driver().unwrap().current.borrow_mut().width = 320;
        assert_eq!(dev.query_format().map(|f| f.width), Some(320));
    }

    #[test]
    fn params_keep_the_request_as_given() {
        let driver = SimDriver::camera(MJPG);
        let dev = Device::with_driver(driver, params(), Requirements::CAPTURE).unwrap();

        assert!(dev.params().formats.is_empty());
        assert_eq!(dev.params().width, 0);
        assert_eq!(dev.fourcc(), MJPG);
        assert_eq!((dev.width(), dev.height()), (640, 480));
        assert_eq!(*dev.driver().unwrap().attempts.borrow(), vec![MJPG]);
    }

    #[test]
    fn failed_initialization_ends_closed() {
        let mut driver = SimDriver::camera(YUYV);
        driver.fail_querycap = true;
        let closed = driver.dropped.clone();

        let err = Device::with_driver(driver, params(), Requirements::empty()).unwrap_err();

        assert!(matches!(err, Error::CapabilityQuery(_)));
        assert!(closed.get());
    }

    #[test]
    fn close_is_idempotent() {
        let driver = SimDriver::camera(YUYV);
        let closed = driver.dropped.clone();
        let mut dev = Device::with_driver(driver, params(), Requirements::empty()).unwrap();

        dev.close();
        assert!(closed.get());
        assert_eq!(dev.state(), State::Closed);
        assert_eq!(dev.format(), None);
        assert_eq!(dev.width(), 0);

        dev.close();
        assert_eq!(dev.state(), State::Closed);
        assert!(dev.is_readable(None).is_err());
        assert_eq!(dev.query_format(), None);
    }
}
