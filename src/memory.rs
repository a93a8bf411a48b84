//! In-process backend keeping files in a shared map
//!
//! Files either come from [`MemoryBackend::insert`] (per-channel raw
//! values, as a container library would decode them) or from the export
//! pipeline (packed little-endian records). Readers decode both forms into
//! the same channel-major buffer, so an exported file can be imported again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::backend::{Backend, SignalReader, SignalWriter};
use crate::buffer::{FlatBuffer, RawBuffer};
use crate::error::{ConvertError, Result};
use crate::events::{Event, EventTable};
use crate::types::{ChannelInfo, FileHeader, RecordingInfo};

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    /// 每个通道一组原始值
    Samples(Vec<Vec<f64>>),
    /// 导出流水线写入的打包记录
    Records {
        raw: RawBuffer,
        samples_per_record: usize,
        offsets: Vec<usize>,
    },
}

/// A file held by [`MemoryBackend`]
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{ChannelInfo, Event, FileType, RecordingInfo, StoredFile};
///
/// let info = RecordingInfo::new(FileType::Gdf, 1000.0, 4);
/// let file = StoredFile::new(info)
///     .with_channel(ChannelInfo::new("Vm", 4274), vec![1.0, 2.0, 3.0, 4.0])
///     .with_event(Event::segment_break(2));
///
/// assert_eq!(file.channels().len(), 1);
/// assert_eq!(file.events().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    info: RecordingInfo,
    channels: Vec<ChannelInfo>,
    events: EventTable,
    error: Option<String>,
    payload: Payload,
}

impl StoredFile {
    pub fn new(info: RecordingInfo) -> Self {
        let events = EventTable::new(info.sample_rate);
        StoredFile {
            info,
            channels: Vec::new(),
            events,
            error: None,
            payload: Payload::Samples(Vec::new()),
        }
    }

    /// Adds a channel with its raw (uncalibrated) values
    pub fn with_channel(mut self, channel: ChannelInfo, raw: Vec<f64>) -> Self {
        if let Payload::Samples(samples) = &mut self.payload {
            self.channels.push(channel);
            samples.push(raw);
        }
        self
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_event_sample_rate(mut self, sample_rate: f64) -> Self {
        self.events.set_sample_rate(sample_rate);
        self
    }

    /// Marks the file as having left an error behind on open
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn info(&self) -> &RecordingInfo {
        &self.info
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    /// Packed records, for files written by the export pipeline
    pub fn raw(&self) -> Option<&RawBuffer> {
        match &self.payload {
            Payload::Records { raw, .. } => Some(raw),
            Payload::Samples(_) => None,
        }
    }

    /// Base-clock samples per record, for files written by the export pipeline
    pub fn samples_per_record(&self) -> Option<usize> {
        match &self.payload {
            Payload::Records {
                samples_per_record, ..
            } => Some(*samples_per_record),
            Payload::Samples(_) => None,
        }
    }

    fn raw_channel(&self, channel: usize) -> Result<Vec<f64>> {
        let total = self.info.samples_per_channel;
        match &self.payload {
            Payload::Samples(samples) => {
                let values = samples.get(channel).ok_or_else(|| {
                    ConvertError::ReaderReportedError(format!("no data for channel {}", channel))
                })?;
                if values.len() != total {
                    return Err(ConvertError::ReaderReportedError(format!(
                        "channel {} holds {} samples, header says {}",
                        channel,
                        values.len(),
                        total
                    )));
                }
                Ok(values.clone())
            }
            Payload::Records {
                raw,
                samples_per_record,
                offsets,
            } => {
                let offset = offsets.get(channel).copied().ok_or_else(|| {
                    ConvertError::ReaderReportedError(format!("no block for channel {}", channel))
                })?;
                if *samples_per_record == 0 && total > 0 {
                    return Err(ConvertError::ReaderReportedError(
                        "record length is zero".to_string(),
                    ));
                }
                let stride = raw.bytes_per_record();
                (0..total)
                    .map(|tick| {
                        let record = tick / samples_per_record;
                        let slot = tick % samples_per_record;
                        raw.read_f64(record * stride + offset + slot * 8).ok_or_else(|| {
                            ConvertError::ReaderReportedError(format!(
                                "record {} truncated in channel {}",
                                record, channel
                            ))
                        })
                    })
                    .collect()
            }
        }
    }
}

/// Backend storing files in memory
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: Arc<Mutex<HashMap<PathBuf, StoredFile>>>,
    read_only: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only backend refuses to open writers
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn insert<P: AsRef<Path>>(&self, path: P, file: StoredFile) {
        self.store().insert(path.as_ref().to_path_buf(), file);
    }

    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<StoredFile> {
        self.store().get(path.as_ref()).cloned()
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.store().contains_key(path.as_ref())
    }

    pub fn remove<P: AsRef<Path>>(&self, path: P) -> Option<StoredFile> {
        self.store().remove(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    fn store(&self) -> MutexGuard<'_, HashMap<PathBuf, StoredFile>> {
        // 存储中只有普通数据，中毒后继续使用是安全的
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Backend for MemoryBackend {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn open_reader(&self, path: &Path) -> Result<MemoryReader> {
        let mut file = self.get(path).ok_or_else(|| {
            ConvertError::ReaderOpenFailure(format!("{}: no such file", path.display()))
        })?;
        file.events.sort_by_position();
        debug!("Opened {} for reading", path.display());
        Ok(MemoryReader {
            path: path.to_path_buf(),
            file,
        })
    }

    fn open_writer(&self, path: &Path, header: FileHeader) -> Result<MemoryWriter> {
        if self.read_only {
            return Err(ConvertError::WriterFailure(format!(
                "{}: store is read-only",
                path.display()
            )));
        }
        if path.as_os_str().is_empty() {
            return Err(ConvertError::WriterFailure("empty file name".to_string()));
        }
        for channel in &header.channels {
            let end = channel
                .samples_per_record
                .checked_mul(8)
                .and_then(|n| n.checked_add(channel.byte_offset));
            if end.map_or(true, |end| end > header.bytes_per_record) {
                return Err(ConvertError::WriterFailure(format!(
                    "block of channel '{}' exceeds the record size",
                    channel.label
                )));
            }
            // 每个记录必须容纳整数个原始样本
            let ticks = channel.interval_ticks;
            if ticks == 0 || channel.samples_per_record % ticks != 0 {
                return Err(ConvertError::WriterFailure(format!(
                    "channel '{}': {} ticks per sample do not divide {} ticks per record",
                    channel.label, ticks, channel.samples_per_record
                )));
            }
        }
        debug!("Opened {} for writing", path.display());
        Ok(MemoryWriter {
            path: path.to_path_buf(),
            header,
            bytes: Vec::new(),
            records: 0,
            files: Arc::clone(&self.files),
            finished: false,
        })
    }
}

pub struct MemoryReader {
    path: PathBuf,
    file: StoredFile,
}

impl SignalReader for MemoryReader {
    fn info(&self) -> &RecordingInfo {
        &self.file.info
    }

    fn error_message(&self) -> Option<&str> {
        self.file.error.as_deref()
    }

    fn events(&self) -> &EventTable {
        &self.file.events
    }

    fn channel_count(&self) -> usize {
        self.file.channels.len()
    }

    fn channel(&self, index: usize) -> Result<&ChannelInfo> {
        self.file.channels.get(index).ok_or_else(|| {
            ConvertError::ReaderReportedError(format!("channel index {} out of range", index))
        })
    }

    fn channel_mut(&mut self, index: usize) -> Result<&mut ChannelInfo> {
        self.file.channels.get_mut(index).ok_or_else(|| {
            ConvertError::ReaderReportedError(format!("channel index {} out of range", index))
        })
    }

    fn read_all_samples(&mut self) -> Result<FlatBuffer> {
        let total = self.file.info.samples_per_channel;
        let mut data = Vec::new();
        let mut channels = 0;
        for (index, channel) in self.file.channels.iter().enumerate() {
            if !channel.on {
                continue;
            }
            let raw = self.file.raw_channel(index)?;
            data.extend(raw.into_iter().map(|v| channel.to_physical(v)));
            channels += 1;
        }
        FlatBuffer::new(data, channels, total)
    }
}

impl Drop for MemoryReader {
    fn drop(&mut self) {
        debug!("Closed {}", self.path.display());
    }
}

pub struct MemoryWriter {
    path: PathBuf,
    header: FileHeader,
    bytes: Vec<u8>,
    records: usize,
    files: Arc<Mutex<HashMap<PathBuf, StoredFile>>>,
    finished: bool,
}

impl SignalWriter for MemoryWriter {
    fn write_records(&mut self, buffer: &RawBuffer) -> Result<()> {
        if self.finished {
            return Err(ConvertError::WriterFailure(format!(
                "{}: already finished",
                self.path.display()
            )));
        }
        if buffer.bytes_per_record() != self.header.bytes_per_record {
            return Err(ConvertError::WriterFailure(format!(
                "record size {} does not match header record size {}",
                buffer.bytes_per_record(),
                self.header.bytes_per_record
            )));
        }
        self.bytes.extend_from_slice(buffer.bytes());
        self.records += buffer.records();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.records != self.header.records {
            return Err(ConvertError::WriterFailure(format!(
                "{} records written, header announces {}",
                self.records, self.header.records
            )));
        }

        let header = &self.header;
        let raw = RawBuffer::from_bytes(
            std::mem::take(&mut self.bytes),
            header.bytes_per_record,
            self.records,
        )?;

        let mut info = RecordingInfo::new(
            header.file_type,
            header.sample_rate,
            header.samples_per_channel,
        );
        info.recording_id = header.recording_id.clone();
        info.start = header.start;

        let channels = header
            .channels
            .iter()
            .map(|c| {
                let mut channel = ChannelInfo::new(&c.label, c.phys_dim_code);
                channel.phys_dim = c.y_units.clone();
                channel
            })
            .collect();

        let file = StoredFile {
            info,
            channels,
            events: header.events.clone(),
            error: None,
            payload: Payload::Records {
                raw,
                samples_per_record: header.samples_per_record,
                offsets: header.channels.iter().map(|c| c.byte_offset).collect(),
            },
        };

        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(self.path.clone(), file);
        self.finished = true;
        debug!("Wrote {} records to {}", self.records, self.path.display());
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Discarding unfinished file {}", self.path.display());
        }
    }
}
