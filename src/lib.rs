//! Opening and negotiating Video4Linux2 nodes
//!
//! A [`Device`] opens a node, checks it offers what the caller insists on, selects the video
//! input, settles on a pixel format and frame size the driver actually grants and asks for a
//! frame rate. Streaming the frames themselves is left to the caller, who gets the descriptor
//! and the granted geometry.
//!
//! ```no_run
//! use v4l_negotiate::{Device, DeviceParameters, FourCC, Requirements};
//!
//! let params = DeviceParameters::new("/dev/video0")
//!     .with_formats([FourCC::new(b"YUYV")])
//!     .with_size(640, 480);
//! let dev = Device::open(params, Requirements::CAPTURE).unwrap();
//! println!("bus: {:?}, buffer size: {}", dev.bus_info(), dev.buffer_size());
//! ```

#[cfg(feature = "v4l-sys")]
pub use v4l_sys;

#[cfg(feature = "v4l2-sys")]
pub use v4l2_sys as v4l_sys;

pub mod v4l2;

pub mod buffer;
pub mod capability;
pub mod configure;
pub mod device;
pub mod driver;
pub mod enumerate;
pub mod error;
pub mod format;
pub mod fourcc;
pub mod fraction;
pub mod frameinterval;
pub mod framesize;
pub mod input;
pub mod negotiate;
pub mod parameters;
pub mod probe;
pub mod pselect;
pub mod select;

#[cfg(test)]
mod sim;

pub use capability::{Capabilities, Requirements};
pub use device::{Device, DeviceParameters, State};
pub use driver::{Driver, Handle};
pub use error::{Error, Result};
pub use format::Format;
pub use fourcc::FourCC;
pub use fraction::Fraction;
pub use negotiate::NegotiatedFormat;
pub use parameters::Parameters;
pub use probe::DeviceCapabilities;
pub use select::SelectedInput;
