use bitflags::bitflags;
use std::fmt;

use crate::fraction::Fraction;
use crate::v4l2::c_string;
use crate::v4l_sys::*;

bitflags! {
    #[allow(clippy::unreadable_literal)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Analog video standard set (`v4l2_std_id`)
    pub struct StandardId: u64 {
        const PAL_B         = 0x00000001;
        const PAL_B1        = 0x00000002;
        const PAL_G         = 0x00000004;
        const PAL_H         = 0x00000008;
        const PAL_I         = 0x00000010;
        const PAL_D         = 0x00000020;
        const PAL_D1        = 0x00000040;
        const PAL_K         = 0x00000080;
        const PAL_M         = 0x00000100;
        const PAL_N         = 0x00000200;
        const PAL_NC        = 0x00000400;
        const PAL_60        = 0x00000800;
        const NTSC_M        = 0x00001000;
        const NTSC_M_JP     = 0x00002000;
        const NTSC_443      = 0x00004000;
        const NTSC_M_KR     = 0x00008000;
        const SECAM_B       = 0x00010000;
        const SECAM_D       = 0x00020000;
        const SECAM_G       = 0x00040000;
        const SECAM_H       = 0x00080000;
        const SECAM_K       = 0x00100000;
        const SECAM_K1      = 0x00200000;
        const SECAM_L       = 0x00400000;
        const SECAM_LC      = 0x00800000;
        const ATSC_8_VSB    = 0x01000000;
        const ATSC_16_VSB   = 0x02000000;

        const PAL           = Self::PAL_B.bits() | Self::PAL_B1.bits() | Self::PAL_G.bits()
                            | Self::PAL_H.bits() | Self::PAL_I.bits() | Self::PAL_D.bits()
                            | Self::PAL_D1.bits() | Self::PAL_K.bits();
        const NTSC          = Self::NTSC_M.bits() | Self::NTSC_M_JP.bits() | Self::NTSC_M_KR.bits();
    }
}

impl From<u64> for StandardId {
    fn from(id: u64) -> Self {
        Self::from_bits_retain(id)
    }
}

impl From<StandardId> for u64 {
    fn from(id: StandardId) -> Self {
        id.bits()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Video input as returned by [`crate::v4l2::vidioc::VIDIOC_ENUMINPUT`]
pub struct Input {
    pub index: u32,
    pub name: String,
    /// `V4L2_INPUT_TYPE_*`: 1 = tuner, 2 = camera, 3 = touch
    pub typ: u32,
    /// Standards this input can receive, empty for inputs without analog standards
    pub std: StandardId,
    pub status: u32,
    pub capabilities: u32,
}

impl Input {
    /// Placeholder for drivers that have no notion of inputs
    pub fn anonymous(index: u32) -> Self {
        Input {
            index,
            name: String::new(),
            typ: 0,
            std: StandardId::empty(),
            status: 0,
            capabilities: 0,
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.index)
    }
}

impl From<v4l2_input> for Input {
    fn from(input: v4l2_input) -> Self {
        Self {
            index: input.index,
            name: c_string(&input.name),
            typ: input.type_,
            std: StandardId::from(input.std),
            status: input.status,
            capabilities: input.capabilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Video standard as returned by [`crate::v4l2::vidioc::VIDIOC_ENUMSTD`]
pub struct Standard {
    pub index: u32,
    pub id: StandardId,
    pub name: String,
    pub frame_period: Fraction,
    pub frame_lines: u32,
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} lines, {} s per frame)",
            self.name, self.frame_lines, self.frame_period
        )
    }
}

impl From<v4l2_standard> for Standard {
    fn from(std: v4l2_standard) -> Self {
        Self {
            index: std.index,
            id: StandardId::from(std.id),
            name: c_string(&std.name),
            frame_period: Fraction::from(std.frameperiod),
            frame_lines: std.framelines,
        }
    }
}
