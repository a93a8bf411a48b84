use chrono::{NaiveDate, NaiveDateTime};

use crate::events::EventTable;

/// Container type reported by a reader backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Gdf,
    Abf,
    Edf,
    Unknown,
}

/// Per-channel metadata and calibration as exposed by a reader
///
/// Raw stored values are converted to physical values with
/// `raw * cal + off`. The unit rescaler mutates `cal`/`off` (and the
/// physical range) in place, so the calibration in effect at read time
/// decides the unit of the returned samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub label: String,
    pub phys_dim_code: u16,
    /// Unit string as stored in the file, used when the code is unknown
    pub phys_dim: String,
    /// 关闭的通道在导入时被跳过
    pub on: bool,
    pub cal: f64,
    pub off: f64,
    pub physical_min: f64,
    pub physical_max: f64,
}

impl ChannelInfo {
    pub fn new(label: &str, phys_dim_code: u16) -> Self {
        ChannelInfo {
            label: label.to_string(),
            phys_dim_code,
            phys_dim: String::new(),
            on: true,
            cal: 1.0,
            off: 0.0,
            physical_min: -1e9,
            physical_max: 1e9,
        }
    }

    /// 将存储值转换为物理值
    pub fn to_physical(&self, raw: f64) -> f64 {
        raw * self.cal + self.off
    }

    /// 按比例缩放标定参数
    pub fn apply_scale(&mut self, factor: f64) {
        self.cal *= factor;
        self.off *= factor;
        self.physical_min *= factor;
        self.physical_max *= factor;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manufacturer {
    pub name: Option<String>,
    pub model: Option<String>,
    pub version: Option<String>,
    pub serial_number: Option<String>,
}

/// Recording-wide header information of an opened source file
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub file_type: FileType,
    /// Name and version of the library behind the reader
    pub library_version: String,
    pub recording_id: String,
    pub technician: Option<String>,
    pub manufacturer: Manufacturer,
    /// 采样率（Hz）
    pub sample_rate: f64,
    /// 每个通道的总样本数
    pub samples_per_channel: usize,
    pub start: NaiveDateTime,
}

impl RecordingInfo {
    pub fn new(file_type: FileType, sample_rate: f64, samples_per_channel: usize) -> Self {
        RecordingInfo {
            file_type,
            library_version: format!("sweepbridge v{}", crate::version()),
            recording_id: String::new(),
            technician: None,
            manufacturer: Manufacturer::default(),
            sample_rate,
            samples_per_channel,
            start: default_start(),
        }
    }
}

/// Channel description handed to a writer
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    pub label: String,
    pub y_units: String,
    pub phys_dim_code: u16,
    /// LCM of the channel's section divisors, in base-clock ticks
    pub interval_ticks: usize,
    /// 每个记录中的样本数（基准时钟）
    pub samples_per_record: usize,
    /// 通道块在记录中的字节偏移
    pub byte_offset: usize,
}

/// Everything a writer needs to lay out the output file
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub file_type: FileType,
    pub recording_id: String,
    pub start: NaiveDateTime,
    /// Base-clock sample rate in Hz
    pub sample_rate: f64,
    /// Base-clock ticks per record
    pub samples_per_record: usize,
    pub records: usize,
    /// Expanded samples per channel, excluding padding of the last record
    pub samples_per_channel: usize,
    pub bytes_per_record: usize,
    pub channels: Vec<ChannelHeader>,
    pub events: EventTable,
}

/// Start timestamp used when none is known
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1985, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
