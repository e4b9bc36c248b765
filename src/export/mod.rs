//! CSV time-series sink.
//!
//! Every series file starts with a single `time,value` header written when
//! the file is created. Later writes only append rows. Creation is done with
//! `create_new`, so two writers racing on a fresh file cannot both write the
//! header, but appends from concurrent processes are not coordinated.

use crate::core::Result;
use crate::metrics::types::{NormalizedRecord, SampleValue};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Header row of every series file
pub const HEADER: &str = "time,value";

/// Writes series files under a results directory
#[derive(Debug, Clone)]
pub struct TimeSeriesWriter {
    root: PathBuf,
}

impl TimeSeriesWriter {
    /// Create a writer rooted at `root`. Nothing is touched on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Results directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a series file
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Open a series file for appending, creating it with a header if absent.
    pub fn open(&self, file_name: &str) -> Result<SeriesFile> {
        let path = self.path_for(file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (file, created) = match OpenOptions::new().append(true).create_new(true).open(&path) {
            Ok(file) => (file, true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                (OpenOptions::new().append(true).open(&path)?, false)
            },
            Err(e) => return Err(e.into()),
        };

        let mut writer = BufWriter::new(file);
        if created {
            tracing::debug!("Created series file {:?}", path);
            writeln!(writer, "{}", HEADER)?;
        }

        Ok(SeriesFile {
            path,
            writer,
            rows: 0,
            created,
        })
    }

    /// Append a batch of records to one file through a single handle.
    ///
    /// The handle is closed before returning, whether or not a row failed.
    pub fn write_series<'a, I>(&self, file_name: &str, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let mut file = self.open(file_name)?;
        for record in records {
            file.write_row(record.time, record.value)?;
        }
        file.finish()
    }
}

/// An open series file. Dropping it flushes and closes the handle.
#[derive(Debug)]
pub struct SeriesFile {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
    created: bool,
}

impl SeriesFile {
    /// Append one `time,value` row; a gap leaves the value field empty
    pub fn write_row(&mut self, time: u64, value: Option<SampleValue>) -> Result<()> {
        match value {
            Some(value) => writeln!(self.writer, "{},{}", time, value)?,
            None => writeln!(self.writer, "{},", time)?,
        }
        self.rows += 1;
        Ok(())
    }

    /// Flush and close, returning the number of rows written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        tracing::trace!(
            "Appended {} rows to {:?}{}",
            self.rows,
            self.path,
            if self.created { " (new file)" } else { "" }
        );
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::classify::Category;
    use crate::metrics::types::PartialRecord;
    use tempfile::TempDir;

    fn record(time: u64, value: Option<SampleValue>) -> NormalizedRecord {
        PartialRecord { time, value }.classified(Category::Outgoing)
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let writer = TimeSeriesWriter::new(dir.path().join("results"));
        let batch = vec![record(1000, Some(SampleValue::Int(5))), record(1001, None)];

        assert_eq!(writer.write_series("a.csv", &batch).unwrap(), 2);
        assert_eq!(writer.write_series("a.csv", &batch).unwrap(), 2);

        let content = fs::read_to_string(writer.path_for("a.csv")).unwrap();
        assert_eq!(content, "time,value\n1000,5\n1001,\n1000,5\n1001,\n");
    }

    #[test]
    fn test_reopen_appends_after_header() {
        let dir = TempDir::new().unwrap();
        let writer = TimeSeriesWriter::new(dir.path());

        let first = writer.open("b.csv").unwrap();
        assert_eq!(first.finish().unwrap(), 0);

        let mut second = writer.open("b.csv").unwrap();
        second.write_row(7, Some(SampleValue::Double(100.0))).unwrap();
        assert_eq!(second.finish().unwrap(), 1);

        let content = fs::read_to_string(dir.path().join("b.csv")).unwrap();
        assert_eq!(content, "time,value\n7,100.0\n");
    }

    #[test]
    fn test_existing_file_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("c.csv"), "time,value\n1,1\n").unwrap();
        let writer = TimeSeriesWriter::new(dir.path());

        writer
            .write_series("c.csv", &[record(2, Some(SampleValue::Int(2)))])
            .unwrap();

        let content = fs::read_to_string(dir.path().join("c.csv")).unwrap();
        assert_eq!(content, "time,value\n1,1\n2,2\n");
    }

    #[test]
    fn test_unwritable_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let writer = TimeSeriesWriter::new(&blocker);

        let err = writer.open("d.csv").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
