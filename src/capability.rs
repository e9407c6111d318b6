use bitflags::bitflags;
use std::fmt;

use crate::v4l2::c_string;
use crate::v4l_sys::*;

bitflags! {
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Device capability flags as reported by `VIDIOC_QUERYCAP`
    pub struct Flags: u32 {
        const VIDEO_CAPTURE         = 0x00000001;
        const VIDEO_OUTPUT          = 0x00000002;
        const VIDEO_OVERLAY         = 0x00000004;
        const VBI_CAPTURE           = 0x00000010;
        const VBI_OUTPUT            = 0x00000020;
        const SLICED_VBI_CAPTURE    = 0x00000040;
        const SLICED_VBI_OUTPUT     = 0x00000080;
        const RDS_CAPTURE           = 0x00000100;
        const VIDEO_OUTPUT_OVERLAY  = 0x00000200;
        const HW_FREQ_SEEK          = 0x00000400;
        const RDS_OUTPUT            = 0x00000800;

        const VIDEO_CAPTURE_MPLANE  = 0x00001000;
        const VIDEO_OUTPUT_MPLANE   = 0x00002000;
        const VIDEO_M2M_MPLANE      = 0x00004000;
        const VIDEO_M2M             = 0x00008000;

        const TUNER                 = 0x00010000;
        const AUDIO                 = 0x00020000;
        const RADIO                 = 0x00040000;
        const MODULATOR             = 0x00080000;

        const SDR_CAPTURE           = 0x00100000;
        const EXT_PIX_FORMAT        = 0x00200000;
        const SDR_OUTPUT            = 0x00400000;
        const META_CAPTURE          = 0x00800000;

        const READ_WRITE            = 0x01000000;
        const ASYNC_IO              = 0x02000000;
        const STREAMING             = 0x04000000;
        const META_OUTPUT           = 0x08000000;

        const TOUCH                 = 0x10000000;
        const IO_MC                 = 0x20000000;

        const DEVICE_CAPS           = 0x80000000;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_retain(flags)
    }
}

impl From<Flags> for u32 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Capabilities a caller can insist on when opening a device
    ///
    /// Frame rate control is not a device capability in the kernel's sense (it is announced
    /// through the streaming parameters), so these are kept apart from [`Flags`].
    pub struct Requirements: u32 {
        const CAPTURE           = 0x01;
        const OUTPUT            = 0x02;
        const READ_WRITE        = 0x04;
        const STREAMING         = 0x08;
        const TIME_PER_FRAME    = 0x10;
    }
}

impl Requirements {
    /// The requirements a device with the given flags fulfills
    pub fn offered_by(flags: Flags, time_per_frame: bool) -> Self {
        let mut offered = Requirements::empty();
        offered.set(Requirements::CAPTURE, flags.contains(Flags::VIDEO_CAPTURE));
        offered.set(Requirements::OUTPUT, flags.contains(Flags::VIDEO_OUTPUT));
        offered.set(Requirements::READ_WRITE, flags.contains(Flags::READ_WRITE));
        offered.set(Requirements::STREAMING, flags.contains(Flags::STREAMING));
        offered.set(Requirements::TIME_PER_FRAME, time_per_frame);
        offered
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Device capabilities
pub struct Capabilities {
    /// Driver name, e.g. uvc for usb video class devices
    pub driver: String,
    /// Card name
    pub card: String,
    /// Bus name, e.g. USB or PCI
    pub bus: String,
    /// Version number MAJOR.MINOR.PATCH
    pub version: (u8, u8, u8),

    /// Capabilities of the physical device as a whole
    pub capabilities: Flags,
    /// Capabilities of this particular node, if the driver fills them in
    pub device_caps: Flags,
}

impl Capabilities {
    /// The flags describing the opened node
    ///
    /// Drivers setting [`Flags::DEVICE_CAPS`] describe the node in `device_caps`, older drivers
    /// only report the device wide set.
    pub fn flags(&self) -> Flags {
        if self.capabilities.contains(Flags::DEVICE_CAPS) && !self.device_caps.is_empty() {
            self.device_caps
        } else {
            self.capabilities
        }
    }
}

impl From<v4l2_capability> for Capabilities {
    fn from(cap: v4l2_capability) -> Self {
        Capabilities {
            driver: c_string(&cap.driver),
            card: c_string(&cap.card),
            bus: c_string(&cap.bus_info),
            version: (
                ((cap.version >> 16) & 0xff) as u8,
                ((cap.version >> 8) & 0xff) as u8,
                (cap.version & 0xff) as u8,
            ),
            capabilities: Flags::from(cap.capabilities),
            device_caps: Flags::from(cap.device_caps),
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Driver      : {}", self.driver)?;
        writeln!(f, "Card        : {}", self.card)?;
        writeln!(f, "Bus         : {}", self.bus)?;
        writeln!(
            f,
            "Version     : {}.{}.{}",
            self.version.0, self.version.1, self.version.2
        )?;
        writeln!(f, "Capabilites : {}", self.flags())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(capabilities: Flags, device_caps: Flags) -> Capabilities {
        Capabilities {
            driver: "vivid".to_string(),
            card: "Virtual".to_string(),
            bus: "platform:vivid-000".to_string(),
            version: (6, 1, 0),
            capabilities,
            device_caps,
        }
    }

    #[test]
    fn node_flags_prefer_device_caps() {
        let all = Flags::VIDEO_CAPTURE | Flags::VIDEO_OUTPUT | Flags::DEVICE_CAPS;
        let node = Flags::VIDEO_CAPTURE | Flags::STREAMING;
        assert_eq!(caps(all, node).flags(), node);
        assert_eq!(caps(Flags::VIDEO_CAPTURE, node).flags(), Flags::VIDEO_CAPTURE);
    }

    #[test]
    fn requirements_follow_flags() {
        let offered = Requirements::offered_by(Flags::VIDEO_CAPTURE | Flags::STREAMING, false);
        assert_eq!(offered, Requirements::CAPTURE | Requirements::STREAMING);

        let offered = Requirements::offered_by(Flags::READ_WRITE, true);
        assert_eq!(
            offered,
            Requirements::READ_WRITE | Requirements::TIME_PER_FRAME
        );
    }
}
