use thiserror::Error;

use crate::types::FileType;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Cannot open file: {0}")]
    ReaderOpenFailure(String),

    /// 读取器对该文件类型的错误报告不可靠，交给外层的备用读取器重试
    #[error("Reader cannot reliably report errors for {0:?} files")]
    UnreliableFormatFallback(FileType),

    #[error("Reader reported an error: {0}")]
    ReaderReportedError(String),

    #[error("Cannot insert section {section} into channel {channel}: {reason}")]
    SectionInsertFailure {
        channel: usize,
        section: usize,
        reason: String,
    },

    #[error("File can't be exported: traces have different sizes or no channels found ({0})")]
    ExportSizeMismatch(String),

    #[error("File can't be exported: packed output too large ({0})")]
    ExportTooLarge(String),

    #[error("Section {section} of channel {channel} has invalid sampling interval ratio {ratio}")]
    InvalidSamplingInterval {
        channel: usize,
        section: usize,
        ratio: f64,
    },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("X-axis unit '{0}' is not a time unit")]
    InvalidTimeUnit(String),

    #[error("Writer error: {0}")]
    WriterFailure(String),
}

impl ConvertError {
    /// Returns `true` when the caller should retry the import with another reader.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ConvertError::UnreliableFormatFallback(_))
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_detection() {
        assert!(ConvertError::UnreliableFormatFallback(FileType::Abf).is_fallback());
        assert!(!ConvertError::ReaderReportedError("bad".to_string()).is_fallback());
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = ConvertError::ExportSizeMismatch("channel 1 has 3 sections".to_string());
        assert!(err.to_string().contains("traces have different sizes"));
    }

    #[test]
    fn test_too_large_message() {
        let err = ConvertError::ExportTooLarge("1 channels".to_string());
        assert!(err.to_string().starts_with("File can't be exported"));
        assert!(!err.is_fallback());
    }
}
