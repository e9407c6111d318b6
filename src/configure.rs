//! Frame rate configuration.

use log::{info, warn};

use crate::driver::Driver;
use crate::parameters::Parameters;

/// Asks the driver for `fps` frames per second
///
/// The frame rate is advisory: 0 leaves the parameters untouched, and a driver refusing the
/// request is logged without failing anything. Returns what the driver granted.
pub fn configure_fps<D: Driver + ?Sized>(driver: &D, name: &str, fps: u32) -> Option<Parameters> {
    if fps == 0 {
        return None;
    }

    let granted = match driver.set_params(&Parameters::with_fps(fps)) {
        Ok(granted) => granted,
        Err(e) => {
            warn!("{}: cannot set param: {}", name, e);
            return None;
        }
    };

    info!(
        "{}: setting fps:{} nbBuffer:{}",
        name, granted.interval, granted.read_buffers
    );
    if granted.interval != Parameters::with_fps(fps).interval {
        info!(
            "{}: asked for {} fps, driver runs at {:?} fps",
            name,
            fps,
            granted.interval.as_fps()
        );
    }

    Some(granted)
}
