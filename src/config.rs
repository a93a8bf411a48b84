use crate::types::FileType;

/// Settings for the import pipeline
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{FileType, ImportOptions};
///
/// let options = ImportOptions::default()
///     .with_fallback_types(vec![FileType::Abf, FileType::Edf])
///     .with_scaling_label("amplifier gain");
/// assert!(options.is_fallback_type(FileType::Edf));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// File types whose reader errors are passed on as a fallback signal
    pub fallback_types: Vec<FileType>,
    /// Label stored as the recording's scaling method
    pub scaling_label: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            fallback_types: vec![FileType::Abf],
            scaling_label: "reader scaling factor".to_string(),
        }
    }
}

impl ImportOptions {
    pub fn with_fallback_types(mut self, types: Vec<FileType>) -> Self {
        self.fallback_types = types;
        self
    }

    pub fn with_scaling_label(mut self, label: &str) -> Self {
        self.scaling_label = label.to_string();
        self
    }

    pub fn is_fallback_type(&self, file_type: FileType) -> bool {
        self.fallback_types.contains(&file_type)
    }
}

/// Settings for the export pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub file_type: FileType,
    /// Reject x-units that are not time units instead of assuming `ms`
    pub strict_time_units: bool,
    /// Value stored in record slots past the end of the data
    pub pad_value: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            file_type: FileType::Gdf,
            strict_time_units: false,
            pad_value: f64::NAN,
        }
    }
}

impl ExportOptions {
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn with_strict_time_units(mut self, strict: bool) -> Self {
        self.strict_time_units = strict;
        self
    }

    pub fn with_pad_value(mut self, pad_value: f64) -> Self {
        self.pad_value = pad_value;
        self
    }
}
