//! Sales report export as CSV.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate};
use thiserror::Error;
use tracing::info;

use celcontrol_core::{ServiceError, parse_rfc3339};

use crate::model::SaleRecord;

pub const CSV_HEADER: &str = "Cliente,Modelo,IMEI,Canal,Enganche,Fecha";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("nothing to export")]
    NothingToExport,

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ExportError> for ServiceError {
    fn from(err: ExportError) -> Self {
        match err {
            e @ ExportError::NothingToExport => ServiceError::Validation(e.to_string()),
            e @ ExportError::Io { .. } => ServiceError::Internal(e.to_string()),
        }
    }
}

/// Render the sales report, one line per sale in the given order.
pub fn render_sales_csv(records: &[SaleRecord], tz: FixedOffset) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut out = String::from(CSV_HEADER);
    for record in records {
        let sale = &record.sale;
        let date = sale
            .created_at
            .as_deref()
            .map(|ts| format_date(ts, tz))
            .unwrap_or_default();
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\n{},{},{},{},{},{}",
            quote(&sale.client_name),
            quote(record.model.as_deref().unwrap_or("")),
            quote(record.imei.as_deref().unwrap_or("")),
            quote(&sale.channel),
            sale.down_payment.normalize(),
            quote(&date),
        );
    }
    Ok(out)
}

/// `D/M/YYYY` in the given offset; blank when the timestamp is unreadable.
pub fn format_date(timestamp: &str, tz: FixedOffset) -> String {
    parse_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&tz).format("%-d/%-m/%Y").to_string())
        .unwrap_or_default()
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("ventas_celcontrol_pro_{}.csv", date.format("%Y-%m-%d"))
}

/// Write a rendered report into `dir` under the dated file name.
pub fn write_report(dir: &Path, date: NaiveDate, contents: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_filename(date));
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::write(&path, contents).map_err(io_err)?;
    info!("sales report written to {}", path.display());
    Ok(path)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
