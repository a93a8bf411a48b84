//! # sweepbridge
//!
//! Converts biosignal recordings between two layouts:
//!
//! - the **flat** layout of container libraries: one sample buffer per
//!   channel at a single rate, plus an event table in which
//!   segment-break markers (`0x7ffe`) separate the sweeps;
//! - the **hierarchical** layout of analysis software: a [`Recording`] of
//!   [`Channel`]s, each an ordered list of [`Section`]s that may carry their
//!   own sampling interval.
//!
//! The container library itself stays outside this crate. It is reached
//! through the [`Backend`], [`SignalReader`] and [`SignalWriter`] traits;
//! [`MemoryBackend`] implements them in process.
//!
//! ## Quick Start
//!
//! ### Importing a file
//!
//! ```rust
//! use sweepbridge::{Converter, MemoryBackend, NoProgress, Result};
//!
//! fn main() -> Result<()> {
//!     # let backend = MemoryBackend::new();
//!     # sweepbridge::doctest_utils::seed_two_sweep_file(&backend, "cell.gdf");
//!     let converter = Converter::new(backend);
//!
//!     let recording = converter.import("cell.gdf", &mut NoProgress)?;
//!     println!("{} channels, {} sweeps", recording.len(), recording[0].len());
//!     println!("Sampling interval: {} {}", recording.x_scale(), recording.x_units());
//!
//!     // Voltage channels arrive in mV, current channels in pA
//!     assert_eq!(recording[0].y_units(), "mV");
//!     assert_eq!(recording[1].y_units(), "pA");
//!     Ok(())
//! }
//! ```
//!
//! ### Exporting sweeps with different sampling intervals
//!
//! Each section's interval must be an integer multiple of the recording's
//! x-scale. Slower sections are expanded onto the common clock by repeating
//! samples.
//!
//! ```rust
//! use sweepbridge::{Channel, Converter, MemoryBackend, NoProgress, Recording, Section};
//!
//! let backend = MemoryBackend::new();
//! let converter = Converter::new(backend.clone());
//!
//! let mut recording = Recording::new();
//! recording.set_x_scale(0.1);
//! recording.set_x_units("ms");
//!
//! let mut channel = Channel::new("Vm", "mV");
//! channel.push_section(Section::from_samples(vec![1.0, 2.0, 3.0], 0.1));
//! channel.push_section(Section::from_samples(vec![4.0], 0.3));
//! recording.push_channel(channel);
//!
//! converter.export("sweeps.gdf", &recording, &mut NoProgress)?;
//!
//! let imported = converter.import("sweeps.gdf", &mut NoProgress)?;
//! assert_eq!(imported[0][0].samples(), &[1.0, 2.0, 3.0]);
//! assert_eq!(imported[0][1].samples(), &[4.0, 4.0, 4.0]);
//! # Ok::<(), sweepbridge::ConvertError>(())
//! ```
//!
//! ### Progress reporting
//!
//! Any `FnMut(u8, &str)` closure can receive progress updates:
//!
//! ```rust
//! use sweepbridge::{Converter, MemoryBackend};
//!
//! # let backend = MemoryBackend::new();
//! # sweepbridge::doctest_utils::seed_two_sweep_file(&backend, "cell.gdf");
//! let converter = Converter::new(backend);
//! let mut last = 0;
//! converter.import("cell.gdf", &mut |percent: u8, message: &str| {
//!     println!("{:3}% {}", percent, message);
//!     last = percent;
//! })?;
//! assert_eq!(last, 100);
//! # Ok::<(), sweepbridge::ConvertError>(())
//! ```
//!
//! ### Falling back to another reader
//!
//! Some readers cannot report errors reliably for certain file types. For
//! those types a reader error becomes
//! [`ConvertError::UnreliableFormatFallback`], which callers use to retry
//! with a different reader:
//!
//! ```rust
//! use sweepbridge::{Converter, FileType, MemoryBackend, NoProgress};
//! use sweepbridge::{RecordingInfo, StoredFile};
//!
//! let backend = MemoryBackend::new();
//! backend.insert(
//!     "trace.abf",
//!     StoredFile::new(RecordingInfo::new(FileType::Abf, 1000.0, 0)).with_error("bad header"),
//! );
//!
//! let converter = Converter::new(backend);
//! match converter.import("trace.abf", &mut NoProgress) {
//!     Err(e) if e.is_fallback() => println!("retrying with another reader"),
//!     other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
//! }
//! ```

pub mod backend;
pub mod buffer;
pub mod config;
pub mod converter;
pub mod error;
pub mod events;
pub mod export;
pub mod import;
pub mod memory;
pub mod progress;
pub mod recording;
pub mod types;
pub mod units;
pub mod utils;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use backend::{Backend, SignalReader, SignalWriter};
pub use buffer::{FlatBuffer, RawBuffer};
pub use config::{ExportOptions, ImportOptions};
pub use converter::Converter;
pub use error::{ConvertError, Result};
pub use events::{Event, EventTable, ANNOTATION_KIND_LIMIT, SEGMENT_BREAK};
pub use memory::{MemoryBackend, StoredFile};
pub use progress::{NoProgress, ProgressSink};
pub use recording::{Channel, Recording, Section};
pub use types::{ChannelHeader, ChannelInfo, FileHeader, FileType, Manufacturer, RecordingInfo};
pub use units::{BasicUnits, UnitRegistry};

/// Library version
///
/// Returns the current version of the sweepbridge library.
///
/// # Examples
///
/// ```rust
/// let version = sweepbridge::version();
/// assert!(!version.is_empty());
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
