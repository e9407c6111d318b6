use std::convert::TryFrom;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::{io, mem};

use log::warn;

use crate::buffer::Type;
use crate::capability::Capabilities;
use crate::enumerate::Enumeration;
use crate::format::{Description, Format};
use crate::fourcc::FourCC;
use crate::frameinterval::FrameInterval;
use crate::framesize::FrameSize;
use crate::input::{Input, Standard};
use crate::parameters::Parameters;
use crate::v4l2;
use crate::v4l_sys::*;

/// The driver requests negotiation is built from
///
/// Each method is one ioctl. Implementations report driver errors unchanged; in particular the
/// `enum_*` methods must fail with `EINVAL` ([`io::ErrorKind::InvalidInput`]) once `index` is past
/// the last entry. [`Handle`] talks to a real device node.
pub trait Driver {
    /// `VIDIOC_QUERYCAP`
    fn query_caps(&self) -> io::Result<Capabilities>;

    /// `VIDIOC_ENUM_FMT` for the given index
    fn enum_format(&self, index: u32) -> io::Result<Description>;

    /// `VIDIOC_ENUM_FRAMESIZES` for the given pixel format and index
    fn enum_framesize(&self, fourcc: FourCC, index: u32) -> io::Result<FrameSize>;

    /// `VIDIOC_ENUM_FRAMEINTERVALS` for the given pixel format, frame size and index
    fn enum_frameinterval(
        &self,
        fourcc: FourCC,
        width: u32,
        height: u32,
        index: u32,
    ) -> io::Result<FrameInterval>;

    /// `VIDIOC_S_INPUT`
    fn set_input(&self, index: u32) -> io::Result<()>;

    /// `VIDIOC_G_INPUT`
    fn input(&self) -> io::Result<u32>;

    /// `VIDIOC_ENUMINPUT` for the given index
    fn enum_input(&self, index: u32) -> io::Result<Input>;

    /// `VIDIOC_ENUMSTD` for the given index
    fn enum_standard(&self, index: u32) -> io::Result<Standard>;

    /// `VIDIOC_G_FMT`
    fn format(&self) -> io::Result<Format>;

    /// `VIDIOC_S_FMT`
    ///
    /// Returns the format as the driver wrote it back into the request. Drivers adjust what
    /// they cannot do, so this may differ from `fmt` in any field, including the pixel format.
    fn set_format(&self, fmt: &Format) -> io::Result<Format>;

    /// `VIDIOC_G_PARM`
    fn params(&self) -> io::Result<Parameters>;

    /// `VIDIOC_S_PARM`, returning the parameters the driver wrote back
    fn set_params(&self, params: &Parameters) -> io::Result<Parameters>;

    /// The file descriptor behind this driver, if there is one
    fn raw_fd(&self) -> Option<RawFd> {
        None
    }

    /// All pixel formats
    fn formats(&self) -> Enumeration<'_, Description> {
        Enumeration::new(move |index| self.enum_format(index))
    }

    /// All frame sizes of a pixel format
    fn framesizes(&self, fourcc: FourCC) -> Enumeration<'_, FrameSize> {
        Enumeration::new(move |index| self.enum_framesize(fourcc, index))
    }

    /// All frame intervals of a pixel format at a discrete frame size
    fn frameintervals(
        &self,
        fourcc: FourCC,
        width: u32,
        height: u32,
    ) -> Enumeration<'_, FrameInterval> {
        Enumeration::new(move |index| self.enum_frameinterval(fourcc, width, height, index))
    }

    /// All video standards
    fn standards(&self) -> Enumeration<'_, Standard> {
        Enumeration::new(move |index| self.enum_standard(index))
    }
}

/// Exclusive owner of an open device node
///
/// The descriptor is closed when the handle is dropped.
#[derive(Debug)]
pub struct Handle {
    fd: std::os::raw::c_int,
    typ: Type,
}

impl Handle {
    /// Opens a device node
    ///
    /// # Arguments
    ///
    /// * `path` - Node path, usually `/dev/videoX`
    /// * `flags` - Open flags, e.g. `libc::O_RDWR | libc::O_NONBLOCK`
    /// * `typ` - Buffer type used for format and parameter requests
    ///
    /// # Example
    ///
    /// ```
    /// use v4l_negotiate::{buffer::Type, Handle};
    /// let handle = Handle::open("/dev/video0", libc::O_RDWR, Type::VideoCapture);
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, flags: i32, typ: Type) -> io::Result<Self> {
        let fd = v4l2::open(path, flags)?;
        Ok(Handle { fd, typ })
    }

    /// Returns the raw fd of the device
    pub fn fd(&self) -> std::os::raw::c_int {
        self.fd
    }

    /// Buffer type this handle negotiates for
    pub fn typ(&self) -> Type {
        self.typ
    }

    /// # Safety
    ///
    /// `params` must have been filled in by the driver for this handle's buffer type.
    unsafe fn parameters_from(&self, params: v4l2_streamparm) -> Parameters {
        match self.typ {
            Type::VideoCapture => Parameters::from(params.parm.capture),
            Type::VideoOutput => Parameters::from(params.parm.output),
        }
    }

    /// # Safety
    ///
    /// `arg` must be the argument type `request` was encoded with.
    unsafe fn ioctl<T>(&self, request: v4l2::vidioc::_IOC_TYPE, arg: &mut T) -> io::Result<()> {
        v4l2::ioctl(self.fd, request, arg as *mut T as *mut std::os::raw::c_void)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = v4l2::close(self.fd) {
            warn!("closing fd {} failed: {}", self.fd, e);
        }
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

impl Driver for Handle {
    fn query_caps(&self) -> io::Result<Capabilities> {
        unsafe {
            let mut v4l2_caps: v4l2_capability = mem::zeroed();
            self.ioctl(v4l2::vidioc::VIDIOC_QUERYCAP, &mut v4l2_caps)?;
            Ok(Capabilities::from(v4l2_caps))
        }
    }

    fn enum_format(&self, index: u32) -> io::Result<Description> {
        let mut v4l2_fmt = v4l2_fmtdesc {
            index,
            type_: self.typ as u32,
            ..unsafe { mem::zeroed() }
        };
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_ENUM_FMT, &mut v4l2_fmt)? };
        Ok(Description::from(v4l2_fmt))
    }

    fn enum_framesize(&self, fourcc: FourCC, index: u32) -> io::Result<FrameSize> {
        let mut v4l2_struct = v4l2_frmsizeenum {
            index,
            pixel_format: fourcc.into(),
            ..unsafe { mem::zeroed() }
        };
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_ENUM_FRAMESIZES, &mut v4l2_struct)? };
        FrameSize::try_from(v4l2_struct).map_err(invalid_data)
    }

    fn enum_frameinterval(
        &self,
        fourcc: FourCC,
        width: u32,
        height: u32,
        index: u32,
    ) -> io::Result<FrameInterval> {
        let mut v4l2_struct = v4l2_frmivalenum {
            index,
            pixel_format: fourcc.into(),
            width,
            height,
            ..unsafe { mem::zeroed() }
        };
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_ENUM_FRAMEINTERVALS, &mut v4l2_struct)? };
        FrameInterval::try_from(v4l2_struct).map_err(invalid_data)
    }

    fn set_input(&self, index: u32) -> io::Result<()> {
        let mut index = index as std::os::raw::c_int;
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_S_INPUT, &mut index) }
    }

    fn input(&self) -> io::Result<u32> {
        let mut index: std::os::raw::c_int = 0;
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_G_INPUT, &mut index)? };
        Ok(index as u32)
    }

    fn enum_input(&self, index: u32) -> io::Result<Input> {
        let mut v4l2_input = v4l2_input {
            index,
            ..unsafe { mem::zeroed() }
        };
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_ENUMINPUT, &mut v4l2_input)? };
        Ok(Input::from(v4l2_input))
    }

    fn enum_standard(&self, index: u32) -> io::Result<Standard> {
        let mut v4l2_std = v4l2_standard {
            index,
            ..unsafe { mem::zeroed() }
        };
        unsafe { self.ioctl(v4l2::vidioc::VIDIOC_ENUMSTD, &mut v4l2_std)? };
        Ok(Standard::from(v4l2_std))
    }

    fn format(&self) -> io::Result<Format> {
        unsafe {
            let mut v4l2_fmt = v4l2_format {
                type_: self.typ as u32,
                ..mem::zeroed()
            };
            self.ioctl(v4l2::vidioc::VIDIOC_G_FMT, &mut v4l2_fmt)?;
            Ok(Format::from(v4l2_fmt.fmt.pix))
        }
    }

    fn set_format(&self, fmt: &Format) -> io::Result<Format> {
        unsafe {
            let mut v4l2_fmt = v4l2_format {
                type_: self.typ as u32,
                fmt: v4l2_format__bindgen_ty_1 { pix: (*fmt).into() },
            };
            self.ioctl(v4l2::vidioc::VIDIOC_S_FMT, &mut v4l2_fmt)?;
            Ok(Format::from(v4l2_fmt.fmt.pix))
        }
    }

    fn params(&self) -> io::Result<Parameters> {
        unsafe {
            let mut v4l2_params = v4l2_streamparm {
                type_: self.typ as u32,
                ..mem::zeroed()
            };
            self.ioctl(v4l2::vidioc::VIDIOC_G_PARM, &mut v4l2_params)?;
            Ok(self.parameters_from(v4l2_params))
        }
    }

    fn set_params(&self, params: &Parameters) -> io::Result<Parameters> {
        unsafe {
            let mut v4l2_params = v4l2_streamparm {
                type_: self.typ as u32,
                parm: match self.typ {
                    Type::VideoCapture => v4l2_streamparm__bindgen_ty_1 {
                        capture: (*params).into(),
                    },
                    Type::VideoOutput => v4l2_streamparm__bindgen_ty_1 {
                        output: (*params).into(),
                    },
                },
            };
            self.ioctl(v4l2::vidioc::VIDIOC_S_PARM, &mut v4l2_params)?;
            Ok(self.parameters_from(v4l2_params))
        }
    }

    fn raw_fd(&self) -> Option<RawFd> {
        Some(self.fd)
    }
}
