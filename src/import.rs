//! Flat buffer + event table → hierarchical recording

use log::{debug, info};

use crate::backend::SignalReader;
use crate::buffer::FlatBuffer;
use crate::config::ImportOptions;
use crate::error::{ConvertError, Result};
use crate::events::EventTable;
use crate::progress::{percent, ProgressSink};
use crate::recording::{Channel, Recording, Section};
use crate::types::{ChannelInfo, RecordingInfo};
use crate::units::{rescale_channel, UnitRegistry};
use crate::utils::{format_annotation, format_date, format_time};

/// Section boundaries as absolute sample offsets
///
/// Always starts with `0` and ends with the total sample count, so a list
/// of `n + 1` offsets describes `n` sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentIndex {
    bounds: Vec<usize>,
}

impl SegmentIndex {
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn sections(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Half-open sample range of section `index`
    pub fn range(&self, index: usize) -> Option<(usize, usize)> {
        Some((*self.bounds.get(index)?, *self.bounds.get(index + 1)?))
    }
}

/// Result of scanning an event table
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEvents {
    pub segments: SegmentIndex,
    /// One `"<seconds> s:\t<description>\n"` line per user annotation
    pub annotations: String,
}

/// Derives section boundaries and annotation text from a sorted event table
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{Event, EventTable};
/// use sweepbridge::import::index_segments;
///
/// let mut events = EventTable::new(1000.0);
/// events.push(Event::segment_break(100));
/// events.push(Event::annotation(5, 200, "stim"));
/// events.push(Event::segment_break(250));
///
/// let indexed = index_segments(&events, 400);
/// assert_eq!(indexed.segments.bounds(), &[0, 100, 250, 400]);
/// assert_eq!(indexed.annotations, "0.200000 s:\tstim\n");
/// ```
pub fn index_segments(events: &EventTable, total_samples: usize) -> IndexedEvents {
    let mut bounds = vec![0];
    let mut annotations = String::new();

    for event in events {
        if event.is_segment_break() {
            bounds.push(event.position);
        } else if event.is_annotation() {
            annotations.push_str(&format_annotation(
                event.position,
                events.sample_rate(),
                &event.description,
            ));
        }
    }
    bounds.push(total_samples);

    IndexedEvents {
        segments: SegmentIndex { bounds },
        annotations,
    }
}

/// Slices one buffer channel into sections
///
/// `position` is the channel's index in the buffer (and in the resulting
/// recording), `count` the number of channels being imported.
pub fn build_channel(
    buffer: &FlatBuffer,
    position: usize,
    count: usize,
    segments: &SegmentIndex,
    x_scale: f64,
    progress: &mut dyn ProgressSink,
) -> Result<Channel> {
    let sections = segments.sections();
    let mut channel = Channel::with_sections(sections);

    for index in 0..sections {
        progress.update(
            percent(index + 1, sections, position, count),
            &format!(
                "Reading channel #{} of {}, Section #{} of {}",
                position + 1,
                count,
                index + 1,
                sections
            ),
        );

        let samples = segments
            .range(index)
            .and_then(|(start, end)| buffer.segment(position, start, end))
            .ok_or_else(|| ConvertError::SectionInsertFailure {
                channel: position,
                section: index,
                reason: format!(
                    "samples {:?} outside channel of {} samples",
                    segments.range(index),
                    buffer.samples_per_channel()
                ),
            })?;

        channel
            .insert_section(Section::from_samples(samples.to_vec(), x_scale), index)
            .map_err(|e| match e {
                ConvertError::SectionInsertFailure { section, reason, .. } => {
                    ConvertError::SectionInsertFailure {
                        channel: position,
                        section,
                        reason,
                    }
                }
                other => other,
            })?;
    }

    Ok(channel)
}

/// Free-text description of an imported file
pub fn describe(info: &RecordingInfo, annotations: &str) -> String {
    let mut desc = format!("import with {} ", info.library_version);

    if let Some(technician) = &info.technician {
        desc += &format!("\nTechnician:\t{} ", technician);
    }
    desc += "\nCreated with: ";
    let manufacturer = &info.manufacturer;
    for field in [
        &manufacturer.name,
        &manufacturer.model,
        &manufacturer.version,
        &manufacturer.serial_number,
    ]
    .into_iter()
    .flatten()
    {
        desc += field;
        desc += " ";
    }

    desc += "\nUser specified Annotations:\n";
    desc += annotations;
    desc
}

/// Checks the error state the reader was left in after opening
fn check_reader<R: SignalReader>(reader: &R, options: &ImportOptions) -> Result<()> {
    let Some(message) = reader.error_message() else {
        return Ok(());
    };
    let file_type = reader.info().file_type;
    if options.is_fallback_type(file_type) {
        debug!("Reader error on {:?} file, handing over to fallback: {}", file_type, message);
        return Err(ConvertError::UnreliableFormatFallback(file_type));
    }
    Err(ConvertError::ReaderReportedError(message.to_string()))
}

fn channel_units(channel: &ChannelInfo, units: &dyn UnitRegistry) -> String {
    if channel.phys_dim_code == 0 {
        channel.phys_dim.clone()
    } else {
        units.label(channel.phys_dim_code)
    }
}

/// Converts everything an opened reader holds into a [`Recording`]
///
/// Nothing is returned on failure; the reader stays owned by the caller,
/// which closes it by dropping.
pub fn import_recording<R: SignalReader>(
    reader: &mut R,
    units: &dyn UnitRegistry,
    options: &ImportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Recording> {
    check_reader(reader, options)?;

    let info = reader.info().clone();
    if !(info.sample_rate.is_finite() && info.sample_rate > 0.0) {
        return Err(ConvertError::InvalidSampleRate(info.sample_rate));
    }

    // 确保事件表按时间顺序排列
    let mut events = reader.events().clone();
    events.sort_by_position();
    let indexed = index_segments(&events, info.samples_per_channel);
    debug!(
        "{} events, {} sections of {} samples in total",
        events.len(),
        indexed.segments.sections(),
        info.samples_per_channel
    );

    let mut active = Vec::new();
    for index in 0..reader.channel_count() {
        if reader.channel(index)?.on {
            active.push(index);
        }
    }

    // 先调整标定，再读取数据
    for &index in &active {
        rescale_channel(reader.channel_mut(index)?, units);
    }
    let buffer = reader.read_all_samples()?;
    if buffer.channels() != active.len() {
        return Err(ConvertError::ReaderReportedError(format!(
            "reader returned {} channels, {} are enabled",
            buffer.channels(),
            active.len()
        )));
    }

    let x_scale = 1000.0 / info.sample_rate;
    let mut recording = Recording::new();
    recording.resize(active.len());

    for (position, &index) in active.iter().enumerate() {
        let channel_info = reader.channel(index)?;
        let mut channel = build_channel(
            &buffer,
            position,
            active.len(),
            &indexed.segments,
            x_scale,
            progress,
        )?;
        channel.set_name(&channel_info.label);
        channel.set_y_units(&channel_units(channel_info, units));
        recording.insert_channel(channel, position)?;
    }

    recording.set_comment(&info.recording_id);
    recording.set_file_description(&describe(&info, &indexed.annotations));
    recording.set_x_scale(x_scale);
    recording.set_x_units("ms");
    recording.set_scaling(&options.scaling_label);
    recording.set_date(&format_date(&info.start));
    recording.set_time(&format_time(&info.start));

    info!(
        "Imported {} channels with {} sections each",
        recording.len(),
        indexed.segments.sections()
    );
    Ok(recording)
}

/// Like [`import_recording`], but fills `recording` in place
///
/// On failure `recording` is reset to empty before the error is returned.
pub fn import_into<R: SignalReader>(
    reader: &mut R,
    recording: &mut Recording,
    units: &dyn UnitRegistry,
    options: &ImportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    match import_recording(reader, units, options, progress) {
        Ok(imported) => {
            *recording = imported;
            Ok(())
        }
        Err(e) => {
            recording.clear();
            Err(e)
        }
    }
}
