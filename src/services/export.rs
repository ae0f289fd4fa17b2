//! Tabular export of reports and collaborator tables
//!
//! Files are written to a temporary sibling first and renamed over the
//! target, so a failed run never leaves a half-written export behind and a
//! repeated run replaces the previous one.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{
    error::{AppError, AppResult},
    models::{Report, ReportRow},
};

/// Report export columns, in order
pub const REPORT_COLUMNS: [&str; 19] = [
    "record_id",
    "title",
    "author",
    "publisher",
    "publication_date",
    "publication_year",
    "language",
    "subject",
    "description",
    "url",
    "isbn",
    "issn",
    "document_symbol",
    "series",
    "notes",
    "physical_description",
    "edition",
    "un_body",
    "report_type",
];

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Destination of a report table
pub trait ReportSink {
    fn write_rows(&mut self, rows: &[ReportRow]) -> AppResult<()>;

    fn write_reports(&mut self, reports: &[&Report]) -> AppResult<()> {
        let rows: Vec<ReportRow> = reports.iter().map(|r| ReportRow::from(*r)).collect();
        self.write_rows(&rows)
    }
}

/// CSV with a header row, even when there are no reports
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(inner),
        }
    }

    pub fn into_inner(self) -> AppResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write_rows(&mut self, rows: &[ReportRow]) -> AppResult<()> {
        self.writer.write_record(REPORT_COLUMNS)?;
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON array of rows
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write_rows(&mut self, rows: &[ReportRow]) -> AppResult<()> {
        serde_json::to_writer_pretty(&mut self.writer, rows)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory table; each write replaces the previous contents
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<ReportRow>,
}

impl ReportSink for MemorySink {
    fn write_rows(&mut self, rows: &[ReportRow]) -> AppResult<()> {
        self.rows = rows.to_vec();
        Ok(())
    }
}

/// Write several report tables as one unit.
///
/// Every table is staged before any target is replaced; if one fails, the
/// staged files are removed and no target is touched.
pub fn export_report_tables(tables: &[(&Path, &[&Report])], format: ExportFormat) -> AppResult<()> {
    let mut staged = Vec::with_capacity(tables.len());
    for (path, reports) in tables {
        let result = stage(path, |out| match format {
            ExportFormat::Csv => CsvSink::new(out).write_reports(reports),
            ExportFormat::Json => JsonSink::new(out).write_reports(reports),
        });
        match result {
            Ok(file) => staged.push(file),
            Err(e) => {
                staged.into_iter().for_each(StagedFile::discard);
                return Err(e);
            }
        }
    }

    commit_all(staged)?;
    for (path, reports) in tables {
        tracing::info!("Exported {} reports to {}", reports.len(), path.display());
    }
    Ok(())
}

/// Write serializable rows as CSV under an explicit header
pub fn write_csv_file<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> AppResult<()> {
    stage(path, |out| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })?
    .commit()
}

/// Write a serializable value as pretty JSON
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    stage(path, |out| {
        serde_json::to_writer_pretty(&mut *out, value)?;
        out.write_all(b"\n")?;
        Ok(())
    })?
    .commit()
}

/// A completely written temporary file waiting to replace its target
#[derive(Debug)]
struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    fn commit(self) -> AppResult<()> {
        if let Err(e) = fs::rename(&self.tmp, &self.target) {
            self.discard();
            return Err(e.into());
        }
        Ok(())
    }

    fn discard(self) {
        let _ = fs::remove_file(&self.tmp);
    }
}

fn commit_all(staged: Vec<StagedFile>) -> AppResult<()> {
    let mut pending = staged.into_iter();
    while let Some(file) = pending.next() {
        if let Err(e) = file.commit() {
            pending.for_each(StagedFile::discard);
            return Err(e);
        }
    }
    Ok(())
}

fn stage<F>(path: &Path, write: F) -> AppResult<StagedFile>
where
    F: FnOnce(&mut BufWriter<File>) -> AppResult<()>,
{
    if path.is_dir() {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("export target {} is a directory", path.display()),
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staged = StagedFile {
        tmp: temp_path(path),
        target: path.to_path_buf(),
    };
    let result = File::create(&staged.tmp)
        .map_err(AppError::from)
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out).and_then(|()| out.flush().map_err(AppError::from))
        });

    match result {
        Ok(()) => Ok(staged),
        Err(e) => {
            staged.discard();
            Err(e)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
