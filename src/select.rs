//! Video input selection.

use std::io;

use log::{debug, error, info, warn};

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::input::{Input, Standard};

/// The active input and the standards it can receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInput {
    pub input: Input,
    pub standards: Vec<Standard>,
}

/// Makes `index` the active input and describes it
///
/// Drivers without inputs (`ENOTTY`, typical for webcams) are accepted for index 0 since there is
/// nothing to choose from; asking such a driver for any other input fails.
pub fn select_input<D: Driver + ?Sized>(driver: &D, name: &str, index: u32) -> Result<SelectedInput> {
    if let Err(e) = driver.set_input(index) {
        if index == 0 && e.raw_os_error() == Some(libc::ENOTTY) {
            debug!("{}: no inputs to select from", name);
            return Ok(SelectedInput {
                input: Input::anonymous(0),
                standards: Vec::new(),
            });
        }
        error!("{}: cannot set input {}: {}", name, index, e);
        return Err(Error::InputSelection { index, source: e });
    }

    let selection_failed = |e: io::Error| {
        error!("{}: cannot read back input {}: {}", name, index, e);
        Error::InputSelection { index, source: e }
    };
    let active = driver.input().map_err(selection_failed)?;
    let input = driver.enum_input(active).map_err(selection_failed)?;

    info!("{}: current input {} supports:", name, input.name);

    let (all, err) = driver.standards().exhaust();
    let standards: Vec<Standard> = all
        .iter()
        .filter(|std| std.id.intersects(input.std))
        .cloned()
        .collect();
    for std in &standards {
        info!("{}:   {}", name, std);
    }

    match err {
        Some(e) if all.is_empty() => {
            debug!("{}: no video standards: {}", name, e)
        }
        Some(e) => warn!("{}: standard enumeration stopped early: {}", name, e),
        None if all.is_empty() => debug!("{}: no video standards", name),
        None => {}
    }

    Ok(SelectedInput { input, standards })
}
