//! The physical device channel.
//!
//! The device is a line-oriented serial node: moves come in as lines,
//! signal commands go out as lines. Which port to use is the caller's
//! problem (config); this module just opens the node and splits it into a
//! buffered read half and a write half.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::BufReader;

pub struct Device {
    pub reader: BufReader<File>,
    pub writer: File,
}

/// Open the device node for reading and writing.
///
/// Failure here is process-fatal: without the device there is nothing to
/// bridge.
pub fn open(path: &Path) -> io::Result<Device> {
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)?;
    let write_half = file.try_clone()?;

    Ok(Device {
        reader: BufReader::new(File::from_std(file)),
        writer: File::from_std(write_half),
    })
}
