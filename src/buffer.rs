use crate::error::{ConvertError, Result};

/// Channel-major sample matrix as delivered by a reader
///
/// Channel `c` occupies `data[c * samples_per_channel .. (c + 1) * samples_per_channel]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatBuffer {
    data: Vec<f64>,
    channels: usize,
    samples_per_channel: usize,
}

impl FlatBuffer {
    /// # Errors
    ///
    /// * `ConvertError::ReaderReportedError` - `data` does not hold exactly
    ///   `channels * samples_per_channel` values
    pub fn new(data: Vec<f64>, channels: usize, samples_per_channel: usize) -> Result<Self> {
        if channels.checked_mul(samples_per_channel) != Some(data.len()) {
            return Err(ConvertError::ReaderReportedError(format!(
                "sample buffer holds {} values, expected {} channels x {} samples",
                data.len(),
                channels,
                samples_per_channel
            )));
        }
        Ok(FlatBuffer {
            data,
            channels,
            samples_per_channel,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    pub fn channel(&self, channel: usize) -> Option<&[f64]> {
        self.segment(channel, 0, self.samples_per_channel)
    }

    /// Samples `[start, end)` of one channel, `None` when out of bounds
    pub fn segment(&self, channel: usize, start: usize, end: usize) -> Option<&[f64]> {
        if channel >= self.channels || start > end || end > self.samples_per_channel {
            return None;
        }
        let base = channel * self.samples_per_channel;
        self.data.get(base + start..base + end)
    }
}

/// Byte-packed record buffer handed to a writer
///
/// Invariant: `bytes.len() == bytes_per_record * records`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffer {
    bytes: Vec<u8>,
    bytes_per_record: usize,
    records: usize,
}

impl RawBuffer {
    /// Allocates `records` records, every 8-byte slot set to `fill`
    ///
    /// # Errors
    ///
    /// * `ConvertError::WriterFailure` - the total size overflows `usize`
    pub fn new(bytes_per_record: usize, records: usize, fill: f64) -> Result<Self> {
        let len = bytes_per_record.checked_mul(records).ok_or_else(|| {
            ConvertError::WriterFailure(format!(
                "{} records of {} bytes overflow the address space",
                records, bytes_per_record
            ))
        })?;
        let mut bytes = Vec::with_capacity(len);
        let pattern = fill.to_le_bytes();
        while bytes.len() + 8 <= len {
            bytes.extend_from_slice(&pattern);
        }
        bytes.resize(len, 0);
        Ok(RawBuffer {
            bytes,
            bytes_per_record,
            records,
        })
    }

    /// Wraps already packed bytes
    ///
    /// # Errors
    ///
    /// * `ConvertError::WriterFailure` - length is not `bytes_per_record * records`
    pub fn from_bytes(bytes: Vec<u8>, bytes_per_record: usize, records: usize) -> Result<Self> {
        if bytes_per_record.checked_mul(records) != Some(bytes.len()) {
            return Err(ConvertError::WriterFailure(format!(
                "raw buffer holds {} bytes, expected {} records of {} bytes",
                bytes.len(),
                records,
                bytes_per_record
            )));
        }
        Ok(RawBuffer {
            bytes,
            bytes_per_record,
            records,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_per_record(&self) -> usize {
        self.bytes_per_record
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes `value` little-endian at byte `offset`
    ///
    /// Panics if the slot crosses the end of the buffer; callers derive
    /// offsets from the same geometry the buffer was allocated with.
    pub fn write_f64(&mut self, offset: usize, value: f64) {
        self.bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub fn read_f64(&self, offset: usize) -> Option<f64> {
        let slot = self.bytes.get(offset..offset + 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(slot);
        Some(f64::from_le_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_buffer_segments() {
        let buffer = FlatBuffer::new(vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0], 2, 3).unwrap();
        assert_eq!(buffer.segment(1, 1, 3), Some(&[20.0, 30.0][..]));
        assert_eq!(buffer.channel(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(buffer.segment(0, 2, 4), None);
        assert_eq!(buffer.segment(2, 0, 1), None);
        assert_eq!(buffer.segment(0, 2, 1), None);
    }

    #[test]
    fn test_flat_buffer_size_check() {
        assert!(FlatBuffer::new(vec![0.0; 5], 2, 3).is_err());
    }

    #[test]
    fn test_raw_buffer_little_endian() {
        let mut raw = RawBuffer::new(16, 2, f64::NAN).unwrap();
        assert_eq!(raw.len(), 32);
        assert!(raw.read_f64(24).unwrap().is_nan());

        raw.write_f64(8, 1.5);
        assert_eq!(&raw.bytes()[8..16], &1.5f64.to_le_bytes());
        assert_eq!(raw.read_f64(8), Some(1.5));
        assert_eq!(raw.read_f64(28), None);
    }

    #[test]
    fn test_raw_buffer_size_overflow() {
        let result = RawBuffer::new(usize::MAX / 2, 3, 0.0);
        assert!(matches!(result, Err(ConvertError::WriterFailure(_))));
    }

    #[test]
    fn test_raw_buffer_from_bytes() {
        assert!(RawBuffer::from_bytes(vec![0; 24], 8, 3).is_ok());
        assert!(RawBuffer::from_bytes(vec![0; 20], 8, 3).is_err());
    }
}
