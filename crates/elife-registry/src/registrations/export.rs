use std::fmt::Write as _;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::Registration;
use crate::config::ExportConfig;

pub const EXPORT_COLUMN_COUNT: usize = 11;

/// Spreadsheet header, in column order.
pub const EXPORT_COLUMNS: [&str; EXPORT_COLUMN_COUNT] = [
    "Customer ID",
    "Name",
    "Mobile Number",
    "Category",
    "Address",
    "Panchayath",
    "Ward",
    "Agent/PRO",
    "Status",
    "Applied Date",
    "Updated Date",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("date format '{0}' cannot render calendar dates")]
    DateFormat(String),
    #[error("failed to encode export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ExportRow = [String; EXPORT_COLUMN_COUNT];

/// `registrations_<YYYY-MM-DD>.csv`
pub fn export_file_name(today: NaiveDate) -> String {
    format!("registrations_{}.csv", today.format("%Y-%m-%d"))
}

/// One sheet of registrations, rows in exactly the order they were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    file_name: String,
    rows: Vec<ExportRow>,
}

impl ExportTable {
    pub fn build(
        records: &[Registration],
        config: &ExportConfig,
        today: NaiveDate,
    ) -> Result<Self, ExportError> {
        let rows = records
            .iter()
            .map(|record| export_row(record, config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            file_name: export_file_name(today),
            rows,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(EXPORT_COLUMNS)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }

    /// Writes the table under `directory` using its dated file name.
    pub fn write_to_dir(&self, directory: &Path) -> Result<PathBuf, ExportError> {
        let path = directory.join(&self.file_name);
        let io_error = |source| ExportError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(directory).map_err(io_error)?;
        let file = File::create(&path).map_err(io_error)?;
        self.write_csv(file)?;
        Ok(path)
    }
}

fn export_row(
    record: &Registration,
    config: &ExportConfig,
) -> Result<ExportRow, ExportError> {
    Ok([
        record.customer_id.to_string(),
        record.name.clone(),
        record.mobile_number.to_string(),
        record.category.clone(),
        record.address.clone(),
        record.panchayath.clone(),
        record.ward.clone(),
        record.agent_pro.clone().unwrap_or_default(),
        record.status.label().to_string(),
        calendar_date(record.created_at, config)?,
        calendar_date(record.updated_at, config)?,
    ])
}

fn calendar_date(at: DateTime<Utc>, config: &ExportConfig) -> Result<String, ExportError> {
    let local = at.with_timezone(&config.utc_offset).date_naive();
    let mut rendered = String::new();
    write!(rendered, "{}", local.format(&config.date_format))
        .map_err(|_| ExportError::DateFormat(config.date_format.clone()))?;
    Ok(rendered)
}
