use std::ops::{Index, IndexMut};

use crate::error::{ConvertError, Result};

/// One sweep of a channel
///
/// A section owns its samples and carries its own sampling interval
/// (`x_scale`), expressed in the same unit as the recording's x-scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    data: Vec<f64>,
    x_scale: f64,
    description: String,
}

impl Section {
    /// Creates a zero-filled section of `len` samples
    pub fn new(len: usize, x_scale: f64) -> Self {
        Section {
            data: vec![0.0; len],
            x_scale,
            description: String::new(),
        }
    }

    pub fn from_samples(data: Vec<f64>, x_scale: f64) -> Self {
        Section {
            data,
            x_scale,
            description: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }

    pub fn set_x_scale(&mut self, x_scale: f64) {
        self.x_scale = x_scale;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }
}

impl Index<usize> for Section {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Section {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

/// A named trace made of an ordered list of sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    name: String,
    y_units: String,
    sections: Vec<Section>,
}

impl Channel {
    pub fn new(name: &str, y_units: &str) -> Self {
        Channel {
            name: name.to_string(),
            y_units: y_units.to_string(),
            sections: Vec::new(),
        }
    }

    /// Creates a channel with `count` empty section slots
    pub fn with_sections(count: usize) -> Self {
        Channel {
            name: String::new(),
            y_units: String::new(),
            sections: vec![Section::default(); count],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn y_units(&self) -> &str {
        &self.y_units
    }

    pub fn set_y_units(&mut self, y_units: &str) {
        self.y_units = y_units.to_string();
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Replaces the section slot at `index`
    ///
    /// # Errors
    ///
    /// * `ConvertError::SectionInsertFailure` - `index` is past the last slot
    pub fn insert_section(&mut self, section: Section, index: usize) -> Result<()> {
        let len = self.sections.len();
        match self.sections.get_mut(index) {
            Some(slot) => {
                *slot = section;
                Ok(())
            }
            None => Err(ConvertError::SectionInsertFailure {
                channel: 0,
                section: index,
                reason: format!("channel has only {} section slots", len),
            }),
        }
    }
}

impl Index<usize> for Channel {
    type Output = Section;

    fn index(&self, index: usize) -> &Section {
        &self.sections[index]
    }
}

impl IndexMut<usize> for Channel {
    fn index_mut(&mut self, index: usize) -> &mut Section {
        &mut self.sections[index]
    }
}

/// Hierarchical recording: channels, each with its own sections
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{Channel, Recording, Section};
///
/// let mut recording = Recording::new();
/// recording.set_x_scale(0.1);
/// recording.set_x_units("ms");
///
/// let mut channel = Channel::new("Vm", "mV");
/// channel.push_section(Section::from_samples(vec![-70.0, -69.5, -65.0], 0.1));
/// channel.push_section(Section::from_samples(vec![-71.0, -70.2], 0.1));
/// recording.push_channel(channel);
///
/// assert_eq!(recording.len(), 1);
/// assert_eq!(recording[0].len(), 2);
/// assert_eq!(recording[0][1][0], -71.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    channels: Vec<Channel>,
    comment: String,
    file_description: String,
    date: String,
    time: String,
    x_scale: f64,
    x_units: String,
    scaling: String,
}

impl Default for Recording {
    fn default() -> Self {
        Recording {
            channels: Vec::new(),
            comment: String::new(),
            file_description: String::new(),
            date: String::new(),
            time: String::new(),
            x_scale: 1.0,
            x_units: "ms".to_string(),
            scaling: String::new(),
        }
    }
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Grows or shrinks the channel list, filling new slots with empty channels
    pub fn resize(&mut self, len: usize) {
        self.channels.resize_with(len, Channel::default);
    }

    /// 重置为空记录（通道和元数据全部清除）
    pub fn clear(&mut self) {
        *self = Recording::default();
    }

    pub fn push_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    /// Replaces the channel slot at `index`
    ///
    /// # Errors
    ///
    /// * `ConvertError::SectionInsertFailure` - `index` is past the last slot
    pub fn insert_channel(&mut self, channel: Channel, index: usize) -> Result<()> {
        let len = self.channels.len();
        match self.channels.get_mut(index) {
            Some(slot) => {
                *slot = channel;
                Ok(())
            }
            None => Err(ConvertError::SectionInsertFailure {
                channel: index,
                section: 0,
                reason: format!("recording has only {} channel slots", len),
            }),
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    pub fn file_description(&self) -> &str {
        &self.file_description
    }

    pub fn set_file_description(&mut self, description: &str) {
        self.file_description = description.to_string();
    }

    /// Start date as `YYYY-MM-DD`
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn set_date(&mut self, date: &str) {
        self.date = date.to_string();
    }

    /// Start time as `HH:MM:SS`
    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn set_time(&mut self, time: &str) {
        self.time = time.to_string();
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }

    pub fn set_x_scale(&mut self, x_scale: f64) {
        self.x_scale = x_scale;
    }

    pub fn x_units(&self) -> &str {
        &self.x_units
    }

    pub fn set_x_units(&mut self, x_units: &str) {
        self.x_units = x_units.to_string();
    }

    pub fn scaling(&self) -> &str {
        &self.scaling
    }

    pub fn set_scaling(&mut self, scaling: &str) {
        self.scaling = scaling.to_string();
    }
}

impl Index<usize> for Recording {
    type Output = Channel;

    fn index(&self, index: usize) -> &Channel {
        &self.channels[index]
    }
}

impl IndexMut<usize> for Recording {
    fn index_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_section_in_range() {
        let mut channel = Channel::with_sections(2);
        channel
            .insert_section(Section::from_samples(vec![1.0, 2.0], 0.5), 1)
            .unwrap();
        assert_eq!(channel.len(), 2);
        assert!(channel[0].is_empty());
        assert_eq!(channel[1].samples(), &[1.0, 2.0]);
    }

    #[test]
    fn test_insert_section_out_of_range() {
        let mut channel = Channel::with_sections(1);
        let result = channel.insert_section(Section::new(3, 1.0), 1);
        assert!(matches!(
            result,
            Err(ConvertError::SectionInsertFailure { section: 1, .. })
        ));
    }

    #[test]
    fn test_clear_resets_metadata() {
        let mut recording = Recording::new();
        recording.resize(3);
        recording.set_comment("cell 4");
        recording.set_x_scale(0.05);
        recording.clear();

        assert!(recording.is_empty());
        assert_eq!(recording.comment(), "");
        assert_eq!(recording.x_scale(), 1.0);
    }

    #[test]
    fn test_insert_channel() {
        let mut recording = Recording::new();
        recording.resize(2);
        recording.insert_channel(Channel::new("Im", "pA"), 1).unwrap();
        assert_eq!(recording[1].name(), "Im");
        assert!(recording.insert_channel(Channel::new("x", "mV"), 2).is_err());
    }
}
