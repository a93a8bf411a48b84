//! Capability traits for the container library behind the converter
//!
//! The conversion routines never touch a file format directly. They open
//! handles through a [`Backend`] and talk to them through [`SignalReader`]
//! and [`SignalWriter`]. Handles release their resources on drop, so every
//! early return in a conversion closes the file.

use std::path::Path;

use crate::buffer::{FlatBuffer, RawBuffer};
use crate::error::Result;
use crate::events::EventTable;
use crate::types::{ChannelInfo, FileHeader, RecordingInfo};

/// Read access to an opened source file
pub trait SignalReader {
    fn info(&self) -> &RecordingInfo;

    /// Error state left behind by opening the file, if any
    fn error_message(&self) -> Option<&str>;

    /// Event table of the file, sorted by position
    fn events(&self) -> &EventTable;

    /// Number of channels in the file, including disabled ones
    fn channel_count(&self) -> usize;

    fn channel(&self, index: usize) -> Result<&ChannelInfo>;

    /// Mutable channel calibration; changes apply to later reads
    fn channel_mut(&mut self, index: usize) -> Result<&mut ChannelInfo>;

    /// Reads every sample of every enabled channel in physical units
    ///
    /// The buffer is channel-major and holds only channels whose `on`
    /// flag is set, in file order.
    fn read_all_samples(&mut self) -> Result<FlatBuffer>;
}

/// Write access to a file being created
///
/// Dropping a writer without calling [`SignalWriter::finish`] discards
/// whatever was written.
pub trait SignalWriter {
    fn write_records(&mut self, buffer: &RawBuffer) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Opens reader and writer handles
pub trait Backend {
    type Reader: SignalReader;
    type Writer: SignalWriter;

    fn open_reader(&self, path: &Path) -> Result<Self::Reader>;

    fn open_writer(&self, path: &Path, header: FileHeader) -> Result<Self::Writer>;
}
