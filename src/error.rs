use std::{io, path::PathBuf};

use crate::capability::Requirements;
use crate::fourcc::FourCC;

/// Reasons a device cannot be brought up
///
/// All of these abort initialization; by the time one is returned the device node has been
/// closed again.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The node could not be opened (missing, permissions, wrong mode)
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `VIDIOC_QUERYCAP` failed
    #[error("cannot query capabilities: {0}")]
    CapabilityQuery(#[source] io::Error),

    /// The device lacks something the caller declared mandatory
    #[error("mandatory capabilities {} not available (device offers {offered})", missing(.required, .offered))]
    MandatoryCapabilityMissing {
        required: Requirements,
        offered: Requirements,
    },

    /// The driver refused the requested input
    #[error("cannot select input {index}: {source}")]
    InputSelection {
        index: u32,
        #[source]
        source: io::Error,
    },

    /// None of the candidate pixel formats was granted
    #[error("no candidate format accepted (tried: {})", format_list(.tried))]
    NoFormatAccepted { tried: Vec<FourCC> },
}

/// Result type used throughout device initialization
pub type Result<T> = std::result::Result<T, Error>;

fn missing(required: &Requirements, offered: &Requirements) -> Requirements {
    required.difference(*offered)
}

fn format_list(formats: &[FourCC]) -> String {
    if formats.is_empty() {
        return "none".to_string();
    }
    formats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
