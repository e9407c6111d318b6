use serde::{Deserialize, Serialize};

/// Buffer type
///
/// Format and parameter requests are always made for one buffer type, which is also what decides
/// whether a node is used for capture or output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Type {
    #[default]
    VideoCapture = 1,
    VideoOutput = 2,
}
