use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader};
use encoding_rs::Encoding;

use crate::{derive::DATE_TIME_FORMAT, PipelineConfig, Transaction, REQUIRED_COLUMNS};

/// Possible errors to occur while loading a data source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),
    #[error("The workbook does not contain a sheet with a header row")]
    EmptyWorkbook,
    #[error("Unsupported file type '{0}', expected one of csv, txt, xlsx")]
    UnsupportedFormat(String),
    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Row {row}, column {column}: {message}")]
    InvalidCell {
        row: usize,
        column: String,
        message: String,
    },
}

/// Where a dataset comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// A file handed in by the user
    Upload { name: String, bytes: Vec<u8> },
    /// A dataset on disk, usually the bundled one
    DefaultPath(PathBuf),
}

impl DataSource {
    /// The bundled dataset at [`PipelineConfig::default_data_path`]
    pub fn bundled(config: &PipelineConfig) -> Self {
        DataSource::DefaultPath(config.default_data_path.clone())
    }

    /// Reads a file from disk as if it had been uploaded
    pub fn upload_from_path(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(DataSource::Upload { name, bytes })
    }

    fn describe(&self) -> String {
        match self {
            DataSource::Upload { name, .. } => format!("upload {}", name),
            DataSource::DefaultPath(path) => path.display().to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    fn from_name(name: &str) -> Result<Self, LoadError> {
        let extension = Path::new(name)
            .extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(SourceFormat::Delimited),
            "xlsx" => Ok(SourceFormat::Spreadsheet),
            _ => Err(LoadError::UnsupportedFormat(extension)),
        }
    }
}

/// The records of a data source, before anything is derived from them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDataset {
    columns: Vec<String>,
    transactions: Vec<Transaction>,
}

impl RawDataset {
    /// The column names, in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Transaction>) {
        (self.columns, self.transactions)
    }
}

/// Reads and type-checks all records of a data source
pub fn load(source: &DataSource, config: &PipelineConfig) -> Result<RawDataset, LoadError> {
    let raw = match source {
        DataSource::Upload { name, bytes } => match SourceFormat::from_name(name)? {
            SourceFormat::Delimited => read_delimited(&decode(bytes, &config.encoding)?)?,
            SourceFormat::Spreadsheet => read_spreadsheet(bytes)?,
        },
        DataSource::DefaultPath(path) => {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            read_delimited(&decode(&bytes, &config.encoding)?)?
        }
    };

    tracing::info!(
        source = %source.describe(),
        rows = raw.transactions.len(),
        columns = raw.columns.len(),
        "loaded dataset"
    );
    Ok(raw)
}

fn decode(bytes: &[u8], label: &str) -> Result<String, LoadError> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| LoadError::UnknownEncoding(label.to_string()))?;
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

fn check_required(columns: &[String]) -> Result<(), LoadError> {
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|column| column == *required))
        .map(|required| required.to_string())
        .collect::<Vec<_>>();

    match missing.is_empty() {
        true => Ok(()),
        false => Err(LoadError::MissingColumns(missing)),
    }
}

pub(crate) fn read_delimited(text: &str) -> Result<RawDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let columns = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    check_required(&columns)?;

    let transactions = reader
        .deserialize()
        .collect::<Result<Vec<Transaction>, _>>()?;

    Ok(RawDataset { columns, transactions })
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawDataset, LoadError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptyWorkbook)??;
    let mut rows = range.rows();

    let headers = rows
        .next()
        .ok_or(LoadError::EmptyWorkbook)?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect::<csv::StringRecord>();
    let columns = headers.iter().map(str::to_string).collect::<Vec<_>>();
    check_required(&columns)?;

    let mut transactions = Vec::new();
    for (index, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let mut record = row
            .iter()
            .zip(&columns)
            .map(|(cell, column)| {
                cell_text(cell).ok_or_else(|| LoadError::InvalidCell {
                    // the header is row 1
                    row: index + 2,
                    column: column.clone(),
                    message: format!("Unusable cell value {:?}", cell),
                })
            })
            .collect::<Result<csv::StringRecord, _>>()?;
        record.trim();
        transactions.push(record.deserialize::<Transaction>(Some(&headers))?);
    }

    Ok(RawDataset { columns, transactions })
}

/// Renders a spreadsheet cell the way it would appear in a CSV export
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => Some(String::new()),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => Some(text.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => Some((*value as i64).to_string()),
        Data::Float(value) => Some(value.to_string()),
        Data::Bool(value) => Some(value.to_string()),
        Data::DateTime(value) => value
            .as_datetime()
            .map(|datetime| datetime.format(DATE_TIME_FORMAT).to_string()),
        Data::Error(_) => None,
    }
}
