// Internal utilities for documentation tests
// This file contains helper functions to seed backends for doctests

use std::path::Path;

use crate::events::Event;
use crate::memory::{MemoryBackend, StoredFile};
use crate::types::{ChannelInfo, FileType, RecordingInfo};
use crate::units::{PICOAMPERE, VOLT};

/// Seeds a two-channel, two-sweep file sampled at 10 kHz
///
/// Channel 0 is stored in volts, channel 1 in picoamperes. The sweeps are
/// 5 and 3 samples long.
pub fn seed_two_sweep_file<P: AsRef<Path>>(backend: &MemoryBackend, path: P) {
    let mut info = RecordingInfo::new(FileType::Gdf, 10_000.0, 8);
    info.recording_id = "doctest cell".to_string();

    let file = StoredFile::new(info)
        .with_channel(
            ChannelInfo::new("Vm", VOLT),
            vec![-0.070, -0.069, -0.050, -0.020, -0.065, -0.071, -0.070, -0.070],
        )
        .with_channel(
            ChannelInfo::new("Im", PICOAMPERE),
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 0.0, -5.0, 0.0],
        )
        .with_event(Event::segment_break(5));

    backend.insert(path, file);
}

/// Seeds a single-channel file with one annotation and no sweep markers
pub fn seed_annotated_file<P: AsRef<Path>>(backend: &MemoryBackend, path: P) {
    let file = StoredFile::new(RecordingInfo::new(FileType::Gdf, 1000.0, 400))
        .with_channel(ChannelInfo::new("Vm", VOLT), vec![0.0; 400])
        .with_event(Event::annotation(5, 200, "stim"));

    backend.insert(path, file);
}
