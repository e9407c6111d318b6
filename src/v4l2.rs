pub mod api;
pub use api::*;

pub mod vidioc;

/// Converts a fixed size, NUL padded C string field into an owned string.
///
/// Everything after the first NUL byte is ignored. Invalid UTF-8 is replaced rather than rejected,
/// since drivers are free to put whatever they like into these fields.
pub(crate) fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}
