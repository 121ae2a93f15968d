use std::fs;
use std::path::Path;

use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::info;

use crate::error::Result;

pub const REPORT_HEADERS: [&str; 5] = ["table", "column", "dtype", "null_count", "distinct_count"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub table: String,
    pub column: String,
    pub dtype: String,
    pub null_count: usize,
    /// Distinct non-null values.
    pub distinct_count: usize,
}

/// Accumulates per-column statistics for raw input tables.
#[derive(Debug, Default)]
pub struct Profiler {
    records: Vec<ProfileRecord>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&mut self, df: &DataFrame, table: &str) -> PolarsResult<()> {
        for column in df.get_columns() {
            let null_count = column.null_count();
            let unique = column.as_materialized_series().n_unique()?;
            let distinct_count = if null_count > 0 {
                unique.saturating_sub(1)
            } else {
                unique
            };

            self.records.push(ProfileRecord {
                table: table.to_string(),
                column: column.name().to_string(),
                dtype: column.dtype().to_string(),
                null_count,
                distinct_count,
            });
        }
        Ok(())
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    /// Writes one worksheet with a header row and one row per profiled column.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name("profiling")?;

        for (col, title) in REPORT_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        }

        for (idx, record) in self.records.iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, record.table.as_str())?;
            sheet.write_string(row, 1, record.column.as_str())?;
            sheet.write_string(row, 2, record.dtype.as_str())?;
            sheet.write_number(row, 3, record.null_count as f64)?;
            sheet.write_number(row, 4, record.distinct_count as f64)?;
        }

        workbook.save(path)?;
        info!(path = %path.display(), records = self.records.len(), "Profiling report generated");
        Ok(())
    }
}
