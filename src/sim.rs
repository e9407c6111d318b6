//! Scriptable in-memory driver for unit tests.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use crate::capability::{Capabilities, Flags};
use crate::driver::Driver;
use crate::format::{description, Description, FieldOrder, Format};
use crate::fourcc::FourCC;
use crate::fraction::Fraction;
use crate::frameinterval::{FrameInterval, FrameIntervalEnum};
use crate::framesize::{Discrete, FrameSize, FrameSizeEnum, Stepwise};
use crate::input::{Input, Standard, StandardId};
use crate::parameters::{self, Parameters};

pub const YUYV: FourCC = FourCC::new(b"YUYV");
pub const MJPG: FourCC = FourCC::new(b"MJPG");
pub const GREY: FourCC = FourCC::new(b"GREY");

fn errno(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

fn frame_size(fourcc: FourCC, width: u32, height: u32) -> u32 {
    let bytes_per_pixel = if fourcc == GREY { 1 } else { 2 };
    width * height * bytes_per_pixel
}

type FormatTable = Vec<(Description, Vec<(FrameSizeEnum, Vec<FrameIntervalEnum>)>)>;

pub struct SimDriver {
    pub caps: Capabilities,
    pub fail_querycap: bool,
    pub stream_caps: parameters::Capabilities,
    pub fail_g_parm: bool,
    pub formats: FormatTable,
    pub framesize_errno: Option<i32>,

    pub inputs: Vec<Input>,
    pub active_input: Cell<u32>,
    pub standards: Vec<Standard>,
    pub standard_errno: Option<i32>,

    pub current: RefCell<Format>,
    pub fail_g_fmt: Cell<bool>,
    /// Pixel formats S_FMT grants
    pub accepts: Vec<FourCC>,
    /// Answer to other pixel formats; `None` rejects them with EINVAL
    pub substitute: Option<FourCC>,
    pub max_size: Option<(u32, u32)>,
    /// S_FMT reports a zero image size, like v4l2loopback
    pub stale_set_size: bool,

    pub reject_fps: bool,

    pub attempts: RefCell<Vec<FourCC>>,
    pub requested_sizes: RefCell<Vec<(u32, u32)>>,
    pub fps_requests: RefCell<Vec<Fraction>>,
    pub dropped: Rc<Cell<bool>>,
}

impl SimDriver {
    /// A webcam without inputs, offering YUYV and MJPG, currently set to `current` at 640x480
    pub fn camera(current: FourCC) -> Self {
        let description = |index, fourcc: FourCC, text: &str, flags| Description {
            index,
            typ: 1,
            flags,
            description: text.to_string(),
            fourcc,
        };
        let discrete = |width, height| FrameSizeEnum::Discrete(Discrete { width, height });

        SimDriver {
            caps: Capabilities {
                driver: "uvcvideo".to_string(),
                card: "Sim Cam".to_string(),
                bus: "usb-sim-1".to_string(),
                version: (6, 1, 0),
                capabilities: Flags::VIDEO_CAPTURE
                    | Flags::STREAMING
                    | Flags::READ_WRITE
                    | Flags::DEVICE_CAPS,
                device_caps: Flags::VIDEO_CAPTURE | Flags::STREAMING | Flags::READ_WRITE,
            },
            fail_querycap: false,
            stream_caps: parameters::Capabilities::TIME_PER_FRAME,
            fail_g_parm: false,
            formats: vec![
                (
                    description(0, YUYV, "YUYV 4:2:2", description::Flags::empty()),
                    vec![
                        (
                            discrete(640, 480),
                            vec![
                                FrameIntervalEnum::Discrete(Fraction::new(1, 30)),
                                FrameIntervalEnum::Discrete(Fraction::new(1, 120)),
                            ],
                        ),
                        (
                            discrete(1280, 720),
                            vec![FrameIntervalEnum::Discrete(Fraction::new(1, 10))],
                        ),
                    ],
                ),
                (
                    description(1, MJPG, "Motion-JPEG", description::Flags::COMPRESSED),
                    vec![(
                        FrameSizeEnum::Stepwise(Stepwise {
                            min_width: 160,
                            max_width: 1920,
                            step_width: 16,
                            min_height: 120,
                            max_height: 1080,
                            step_height: 8,
                        }),
                        vec![],
                    )],
                ),
            ],
            framesize_errno: None,
            inputs: Vec::new(),
            active_input: Cell::new(0),
            standards: Vec::new(),
            standard_errno: None,
            current: RefCell::new(Format {
                size: frame_size(current, 640, 480),
                ..Format::new(640, 480, current)
            }),
            fail_g_fmt: Cell::new(false),
            accepts: vec![YUYV, MJPG],
            substitute: None,
            max_size: None,
            stale_set_size: false,
            reject_fps: false,
            attempts: RefCell::new(Vec::new()),
            requested_sizes: RefCell::new(Vec::new()),
            fps_requests: RefCell::new(Vec::new()),
            dropped: Rc::new(Cell::new(false)),
        }
    }

    /// An analog capture card with a PAL composite and an NTSC S-Video input
    pub fn capture_card() -> Self {
        let input = |index, name: &str, std| Input {
            index,
            name: name.to_string(),
            typ: 2,
            std,
            status: 0,
            capabilities: 0,
        };
        let standard = |index, id, name: &str, frame_period, frame_lines| Standard {
            index,
            id,
            name: name.to_string(),
            frame_period,
            frame_lines,
        };

        let mut driver = SimDriver::camera(YUYV);
        driver.caps.driver = "bttv".to_string();
        driver.inputs = vec![
            input(0, "Composite", StandardId::PAL),
            input(1, "S-Video", StandardId::NTSC),
        ];
        driver.standards = vec![
            standard(0, StandardId::PAL_B | StandardId::PAL_G, "PAL-BG", Fraction::new(1, 25), 625),
            standard(1, StandardId::NTSC_M, "NTSC-M", Fraction::new(1001, 30000), 525),
            standard(2, StandardId::SECAM_L, "SECAM-L", Fraction::new(1, 25), 625),
        ];
        driver
    }

    fn table_entry(&self, fourcc: FourCC) -> Option<&[(FrameSizeEnum, Vec<FrameIntervalEnum>)]> {
        self.formats
            .iter()
            .find(|(desc, _)| desc.fourcc == fourcc)
            .map(|(_, sizes)| sizes.as_slice())
    }
}

impl Drop for SimDriver {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

impl Driver for SimDriver {
    fn query_caps(&self) -> io::Result<Capabilities> {
        if self.fail_querycap {
            return Err(errno(libc::EIO));
        }
        Ok(self.caps.clone())
    }

    fn enum_format(&self, index: u32) -> io::Result<Description> {
        self.formats
            .get(index as usize)
            .map(|(desc, _)| desc.clone())
            .ok_or_else(|| errno(libc::EINVAL))
    }

    fn enum_framesize(&self, fourcc: FourCC, index: u32) -> io::Result<FrameSize> {
        if let Some(code) = self.framesize_errno {
            return Err(errno(code));
        }
        let sizes = self.table_entry(fourcc).ok_or_else(|| errno(libc::EINVAL))?;
        let (size, _) = sizes.get(index as usize).ok_or_else(|| errno(libc::EINVAL))?;
        Ok(FrameSize {
            index,
            fourcc,
            typ: if size.as_discrete().is_some() { 1 } else { 3 },
            size: *size,
        })
    }

    fn enum_frameinterval(
        &self,
        fourcc: FourCC,
        width: u32,
        height: u32,
        index: u32,
    ) -> io::Result<FrameInterval> {
        let sizes = self.table_entry(fourcc).ok_or_else(|| errno(libc::EINVAL))?;
        let (_, intervals) = sizes
            .iter()
            .find(|(size, _)| size.as_discrete() == Some(Discrete { width, height }))
            .ok_or_else(|| errno(libc::EINVAL))?;
        let interval = intervals.get(index as usize).ok_or_else(|| errno(libc::EINVAL))?;
        Ok(FrameInterval {
            index,
            fourcc,
            width,
            height,
            typ: 1,
            interval: *interval,
        })
    }

    fn set_input(&self, index: u32) -> io::Result<()> {
        if self.inputs.is_empty() {
            return Err(errno(libc::ENOTTY));
        }
        if index as usize >= self.inputs.len() {
            return Err(errno(libc::EINVAL));
        }
        self.active_input.set(index);
        Ok(())
    }

    fn input(&self) -> io::Result<u32> {
        if self.inputs.is_empty() {
            return Err(errno(libc::ENOTTY));
        }
        Ok(self.active_input.get())
    }

    fn enum_input(&self, index: u32) -> io::Result<Input> {
        self.inputs
            .get(index as usize)
            .cloned()
            .ok_or_else(|| errno(libc::EINVAL))
    }

    fn enum_standard(&self, index: u32) -> io::Result<Standard> {
        match self.standard_errno {
            Some(code) if index > 0 => return Err(errno(code)),
            _ => {}
        }
        if self.standards.is_empty() {
            return Err(errno(libc::ENOTTY));
        }
        self.standards
            .get(index as usize)
            .cloned()
            .ok_or_else(|| errno(libc::EINVAL))
    }

    fn format(&self) -> io::Result<Format> {
        if self.fail_g_fmt.get() {
            return Err(errno(libc::EIO));
        }
        Ok(*self.current.borrow())
    }

    fn set_format(&self, fmt: &Format) -> io::Result<Format> {
        self.attempts.borrow_mut().push(fmt.fourcc);
        self.requested_sizes.borrow_mut().push((fmt.width, fmt.height));

        let fourcc = if self.accepts.contains(&fmt.fourcc) {
            fmt.fourcc
        } else {
            self.substitute.ok_or_else(|| errno(libc::EINVAL))?
        };

        let (width, height) = match self.max_size {
            Some((w, h)) => (fmt.width.min(w), fmt.height.min(h)),
            None => (fmt.width, fmt.height),
        };

        let granted = Format {
            field_order: FieldOrder::Progressive,
            stride: width * 2,
            size: frame_size(fourcc, width, height),
            ..Format::new(width, height, fourcc)
        };
        *self.current.borrow_mut() = granted;

        if self.stale_set_size {
            return Ok(Format { size: 0, ..granted });
        }
        Ok(granted)
    }

    fn params(&self) -> io::Result<Parameters> {
        if self.fail_g_parm {
            return Err(errno(libc::ENOTTY));
        }
        Ok(Parameters {
            capabilities: self.stream_caps,
            ..Parameters::with_fps(30)
        })
    }

    fn set_params(&self, params: &Parameters) -> io::Result<Parameters> {
        self.fps_requests.borrow_mut().push(params.interval);
        if self.reject_fps {
            return Err(errno(libc::EINVAL));
        }
        Ok(Parameters {
            capabilities: self.stream_caps,
            read_buffers: 2,
            ..*params
        })
    }
}
