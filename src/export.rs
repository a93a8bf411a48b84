//! Hierarchical recording → packed records + event table
//!
//! Sections may be sampled at different intervals. Every interval is
//! expressed as an integer multiple (the *divisor*) of the recording's base
//! interval, and each sample is repeated `divisor` times on the base clock.
//! A record spans the LCM of all divisors, so every channel fits whole
//! samples into it.

use std::path::Path;

use log::{debug, info, warn};

use crate::backend::{Backend, SignalWriter};
use crate::buffer::RawBuffer;
use crate::config::ExportOptions;
use crate::error::{ConvertError, Result};
use crate::events::{Event, EventTable};
use crate::progress::{percent, ProgressSink};
use crate::recording::Recording;
use crate::types::{default_start, ChannelHeader, FileHeader};
use crate::units::{UnitRegistry, MILLISECOND, SECOND};
use crate::utils::{lcm, parse_start, ratio_to_divisor};

/// 每个样本固定为 f64
const SAMPLE_BYTES: usize = 8;

/// Largest packed output accepted by [`reconcile`] (4 GiB)
pub const MAX_RAW_BYTES: usize = 1 << 32;

/// Output of the rate reconciler, shared by the event builder and the packer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    divisors: Vec<Vec<usize>>,
    channel_ticks: Vec<usize>,
    samples_per_record: usize,
    samples_per_channel: usize,
    block_bytes: usize,
    bytes_per_record: usize,
    records: usize,
}

impl ExportLayout {
    /// Divisor of every section of `channel`
    pub fn divisors(&self, channel: usize) -> &[usize] {
        &self.divisors[channel]
    }

    /// Per channel: LCM of its section divisors
    pub fn channel_ticks(&self) -> &[usize] {
        &self.channel_ticks
    }

    /// Base-clock ticks per record (LCM over all channels)
    pub fn samples_per_record(&self) -> usize {
        self.samples_per_record
    }

    /// Expanded length of every channel in base-clock ticks
    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    pub fn channels(&self) -> usize {
        self.divisors.len()
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Bytes one channel occupies in a record
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    pub fn bytes_per_record(&self) -> usize {
        self.bytes_per_record
    }

    /// Size of the packed output, never above [`MAX_RAW_BYTES`]
    pub fn total_bytes(&self) -> usize {
        self.bytes_per_record * self.records
    }

    /// Offset of a channel's block within a record (`bi`)
    pub fn byte_offset(&self, channel: usize) -> usize {
        self.block_bytes() * channel
    }

    /// Byte position of base-clock `tick` of `channel`
    pub fn tick_offset(&self, channel: usize, tick: usize) -> usize {
        let record = tick / self.samples_per_record;
        let slot = tick % self.samples_per_record;
        record * self.bytes_per_record() + self.byte_offset(channel) + slot * SAMPLE_BYTES
    }
}

fn mismatch(detail: String) -> ConvertError {
    ConvertError::ExportSizeMismatch(detail)
}

/// Record and buffer sizes in bytes: `(block, record, records)`
fn byte_geometry(
    samples_per_record: usize,
    samples_per_channel: usize,
    channels: usize,
) -> Result<(usize, usize, usize)> {
    let too_large = || {
        ConvertError::ExportTooLarge(format!(
            "{} channels, {} samples per record, {} samples per channel",
            channels, samples_per_record, samples_per_channel
        ))
    };

    let records = samples_per_channel.div_ceil(samples_per_record);
    let block = samples_per_record
        .checked_mul(SAMPLE_BYTES)
        .ok_or_else(too_large)?;
    let record = block.checked_mul(channels).ok_or_else(too_large)?;
    let total = record.checked_mul(records).ok_or_else(too_large)?;
    // 单个记录本身也必须能分配
    if total > MAX_RAW_BYTES || record > MAX_RAW_BYTES {
        return Err(too_large());
    }
    Ok((block, record, records))
}

/// Computes divisors, record length and expanded sizes
///
/// # Errors
///
/// * `ConvertError::ExportSizeMismatch` - no channels, or channels differ in
///   expanded length, section count, or expanded length of any section
/// * `ConvertError::InvalidSamplingInterval` - a section's interval does not
///   round to a positive multiple of the recording's x-scale
/// * `ConvertError::ExportTooLarge` - the packed output would exceed
///   [`MAX_RAW_BYTES`]
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{Channel, Recording, Section};
/// use sweepbridge::export::reconcile;
///
/// let mut recording = Recording::new();
/// recording.set_x_scale(0.1);
///
/// let mut fast = Channel::new("Vm", "mV");
/// fast.push_section(Section::from_samples(vec![0.0; 6], 0.1));
/// let mut slow = Channel::new("Im", "pA");
/// slow.push_section(Section::from_samples(vec![0.0; 2], 0.3));
/// recording.push_channel(fast);
/// recording.push_channel(slow);
///
/// let layout = reconcile(&recording)?;
/// assert_eq!(layout.samples_per_record(), 3);
/// assert_eq!(layout.samples_per_channel(), 6);
/// # Ok::<(), sweepbridge::ConvertError>(())
/// ```
pub fn reconcile(recording: &Recording) -> Result<ExportLayout> {
    if recording.is_empty() {
        return Err(mismatch("recording has no channels".to_string()));
    }

    let base = recording.x_scale();
    let mut divisors = Vec::with_capacity(recording.len());
    let mut channel_ticks = Vec::with_capacity(recording.len());
    let mut samples_per_record = 1;
    let mut samples_per_channel = 0;

    for (c, channel) in recording.channels().iter().enumerate() {
        let mut ticks = 1;
        let mut len = 0usize;
        let mut channel_divisors = Vec::with_capacity(channel.len());

        for (s, section) in channel.sections().iter().enumerate() {
            let ratio = section.x_scale() / base;
            let divisor = ratio_to_divisor(ratio).ok_or(ConvertError::InvalidSamplingInterval {
                channel: c,
                section: s,
                ratio,
            })?;
            ticks = lcm(ticks, divisor)
                .ok_or_else(|| mismatch(format!("record length of channel {} overflows", c)))?;
            len = section
                .len()
                .checked_mul(divisor)
                .and_then(|n| len.checked_add(n))
                .ok_or_else(|| mismatch(format!("channel {} is too long", c)))?;
            channel_divisors.push(divisor);
        }

        samples_per_record = lcm(samples_per_record, ticks)
            .ok_or_else(|| mismatch("record length overflows".to_string()))?;

        if c == 0 {
            samples_per_channel = len;
        } else if len != samples_per_channel {
            return Err(mismatch(format!(
                "channel {} spans {} samples, channel 0 spans {}",
                c, len, samples_per_channel
            )));
        }

        divisors.push(channel_divisors);
        channel_ticks.push(ticks);
    }

    // 所有通道的段数以及每段展开后的长度必须一致
    let first = &recording[0];
    for (c, channel) in recording.channels().iter().enumerate().skip(1) {
        if channel.len() != first.len() {
            return Err(mismatch(format!(
                "channel {} has {} sections, channel 0 has {}",
                c,
                channel.len(),
                first.len()
            )));
        }
        for s in 0..first.len() {
            let expected = first[s].len() * divisors[0][s];
            let actual = channel[s].len() * divisors[c][s];
            if actual != expected {
                return Err(mismatch(format!(
                    "section {} of channel {} spans {} samples, channel 0 spans {}",
                    s, c, actual, expected
                )));
            }
        }
    }

    let (block_bytes, bytes_per_record, records) =
        byte_geometry(samples_per_record, samples_per_channel, divisors.len())?;

    debug!(
        "Reconciled {} channels: {} ticks per record, {} ticks per channel",
        divisors.len(),
        samples_per_record,
        samples_per_channel
    );

    Ok(ExportLayout {
        divisors,
        channel_ticks,
        samples_per_record,
        samples_per_channel,
        block_bytes,
        bytes_per_record,
        records,
    })
}

/// Sample rate of the base clock in Hz
///
/// X-units that are not a time unit are taken as `ms` with a warning,
/// unless `options.strict_time_units` is set.
pub fn base_sample_rate(
    recording: &Recording,
    units: &dyn UnitRegistry,
    options: &ExportOptions,
) -> Result<f64> {
    let mut code = units.code(recording.x_units());
    if code == 0 || units.dimension(code) != SECOND {
        if options.strict_time_units {
            return Err(ConvertError::InvalidTimeUnit(recording.x_units().to_string()));
        }
        warn!(
            "x-units [{}] are not a time unit, assuming [ms]",
            recording.x_units()
        );
        code = MILLISECOND;
    }

    let rate = 1.0 / (units.scale_factor(code) * recording.x_scale());
    if !(rate.is_finite() && rate > 0.0) {
        return Err(ConvertError::InvalidSampleRate(rate));
    }
    Ok(rate)
}

/// One segment-break marker per section boundary, timed by channel 0
pub fn build_event_table(
    recording: &Recording,
    layout: &ExportLayout,
    sample_rate: f64,
) -> EventTable {
    let mut events = EventTable::new(sample_rate);
    let mut position = 0;
    if let Some(channel) = recording.channels().first() {
        for (s, section) in channel.sections().iter().enumerate() {
            if s > 0 {
                events.push(Event::segment_break(position));
            }
            position += section.len() * layout.divisors(0)[s];
        }
    }
    // 位置单调递增，无需再排序
    debug_assert!(events.is_sorted());
    events
}

/// Expands every channel onto the base clock and packs it into records
pub fn pack(
    recording: &Recording,
    layout: &ExportLayout,
    pad_value: f64,
    progress: &mut dyn ProgressSink,
) -> Result<RawBuffer> {
    let mut raw = RawBuffer::new(layout.bytes_per_record(), layout.records(), pad_value)?;
    debug_assert_eq!(raw.len(), layout.total_bytes());

    let count = recording.len();
    for (c, channel) in recording.channels().iter().enumerate() {
        let divisors = layout.divisors(c);
        let mut len = 0;
        for (s, section) in channel.sections().iter().enumerate() {
            let divisor = divisors[s];
            for (n, &value) in section.samples().iter().enumerate() {
                let start = len + n * divisor;
                for tick in start..start + divisor {
                    raw.write_f64(layout.tick_offset(c, tick), value);
                }
            }
            len += section.len() * divisor;
        }
        progress.update(
            percent(c + 1, count, 0, 1),
            &format!("Writing channel #{} of {}", c + 1, count),
        );
    }
    Ok(raw)
}

/// Header describing the packed output
pub fn file_header(
    recording: &Recording,
    layout: &ExportLayout,
    events: EventTable,
    units: &dyn UnitRegistry,
    options: &ExportOptions,
) -> FileHeader {
    let start = parse_start(recording.date(), recording.time()).unwrap_or_else(|| {
        warn!(
            "Cannot parse start '{} {}', using {}",
            recording.date(),
            recording.time(),
            default_start()
        );
        default_start()
    });

    let channels = recording
        .channels()
        .iter()
        .enumerate()
        .map(|(c, channel)| ChannelHeader {
            label: channel.name().to_string(),
            y_units: channel.y_units().to_string(),
            phys_dim_code: units.code(channel.y_units()),
            interval_ticks: layout.channel_ticks()[c],
            samples_per_record: layout.samples_per_record(),
            byte_offset: layout.byte_offset(c),
        })
        .collect();

    FileHeader {
        file_type: options.file_type,
        recording_id: recording.comment().to_string(),
        start,
        sample_rate: events.sample_rate(),
        samples_per_record: layout.samples_per_record(),
        records: layout.records(),
        samples_per_channel: layout.samples_per_channel(),
        bytes_per_record: layout.bytes_per_record(),
        channels,
        events,
    }
}

/// Writes `recording` to `path` through `backend`
///
/// All size checks run before the writer is opened, so a rejected
/// recording leaves nothing behind. The writer is dropped (and its
/// partial output discarded) on every error path.
pub fn export_recording<B: Backend>(
    backend: &B,
    path: &Path,
    recording: &Recording,
    units: &dyn UnitRegistry,
    options: &ExportOptions,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    let layout = reconcile(recording)?;
    let sample_rate = base_sample_rate(recording, units, options)?;
    let events = build_event_table(recording, &layout, sample_rate);
    let raw = pack(recording, &layout, options.pad_value, progress)?;
    let header = file_header(recording, &layout, events, units, options);

    let mut writer = backend.open_writer(path, header)?;
    writer.write_records(&raw)?;
    writer.finish()?;

    info!(
        "Exported {} channels to {} ({} records of {} bytes)",
        layout.channels(),
        path.display(),
        raw.records(),
        raw.bytes_per_record()
    );
    Ok(())
}
