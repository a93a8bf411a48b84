use std::path::Path;

use log::debug;

use crate::backend::Backend;
use crate::config::{ExportOptions, ImportOptions};
use crate::error::Result;
use crate::export::export_recording;
use crate::import::{import_into, import_recording};
use crate::progress::ProgressSink;
use crate::recording::Recording;
use crate::units::{BasicUnits, UnitRegistry};

/// Import/export front end bound to one backend
///
/// Every call opens its own reader or writer handle and closes it before
/// returning, on success and on error alike.
///
/// # Examples
///
/// ```rust
/// use sweepbridge::{Converter, MemoryBackend, NoProgress};
///
/// # let backend = MemoryBackend::new();
/// # sweepbridge::doctest_utils::seed_two_sweep_file(&backend, "cell.gdf");
/// let converter = Converter::new(backend.clone());
///
/// let recording = converter.import("cell.gdf", &mut NoProgress)?;
/// assert_eq!(recording[0].len(), 2);
///
/// converter.export("copy.gdf", &recording, &mut NoProgress)?;
/// let again = converter.import("copy.gdf", &mut NoProgress)?;
/// assert_eq!(again[0][1].samples(), recording[0][1].samples());
/// # Ok::<(), sweepbridge::ConvertError>(())
/// ```
pub struct Converter<B: Backend> {
    backend: B,
    units: Box<dyn UnitRegistry>,
    import_options: ImportOptions,
    export_options: ExportOptions,
}

impl<B: Backend> Converter<B> {
    pub fn new(backend: B) -> Self {
        Converter {
            backend,
            units: Box::new(BasicUnits),
            import_options: ImportOptions::default(),
            export_options: ExportOptions::default(),
        }
    }

    pub fn with_units<U: UnitRegistry + 'static>(mut self, units: U) -> Self {
        self.units = Box::new(units);
        self
    }

    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.import_options = options;
        self
    }

    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    /// Reads the file at `path` into a new recording
    ///
    /// # Errors
    ///
    /// * `ConvertError::ReaderOpenFailure` - the backend cannot open the file
    /// * `ConvertError::UnreliableFormatFallback` - retry with another reader
    /// * `ConvertError::ReaderReportedError` - the reader flagged the file
    /// * `ConvertError::SectionInsertFailure` - markers do not fit the data
    pub fn import<P: AsRef<Path>>(
        &self,
        path: P,
        progress: &mut dyn ProgressSink,
    ) -> Result<Recording> {
        let path = path.as_ref();
        debug!("Importing {}", path.display());
        let mut reader = self.backend.open_reader(path)?;
        import_recording(
            &mut reader,
            self.units.as_ref(),
            &self.import_options,
            progress,
        )
    }

    /// Reads the file at `path` into `recording`
    ///
    /// On failure `recording` is left empty.
    pub fn import_into<P: AsRef<Path>>(
        &self,
        path: P,
        recording: &mut Recording,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let path = path.as_ref();
        debug!("Importing {} in place", path.display());
        let mut reader = match self.backend.open_reader(path) {
            Ok(reader) => reader,
            Err(e) => {
                recording.clear();
                return Err(e);
            }
        };
        import_into(
            &mut reader,
            recording,
            self.units.as_ref(),
            &self.import_options,
            progress,
        )
    }

    /// Writes `recording` to `path`
    ///
    /// # Errors
    ///
    /// * `ConvertError::ExportSizeMismatch` - channels or sections are not aligned
    /// * `ConvertError::InvalidSamplingInterval` - a section interval is unusable
    /// * `ConvertError::ExportTooLarge` - the packed output would not fit in memory
    /// * `ConvertError::WriterFailure` - the backend failed to write
    pub fn export<P: AsRef<Path>>(
        &self,
        path: P,
        recording: &Recording,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        let path = path.as_ref();
        debug!("Exporting {}", path.display());
        export_recording(
            &self.backend,
            path,
            recording,
            self.units.as_ref(),
            &self.export_options,
            progress,
        )
    }
}
