use std::fs;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::LoadError;
use crate::tables::{Table, TableSpec};

/// Cell contents read as missing in every input column.
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// All seven raw inputs of a run.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub user_referrals: DataFrame,
    pub user_referral_logs: DataFrame,
    pub user_logs: DataFrame,
    pub paid_transactions: DataFrame,
    pub referral_rewards: DataFrame,
    pub user_referral_statuses: DataFrame,
    pub lead_log: DataFrame,
}

impl Datasets {
    pub fn get(&self, table: Table) -> &DataFrame {
        match table {
            Table::UserReferrals => &self.user_referrals,
            Table::UserReferralLogs => &self.user_referral_logs,
            Table::UserLogs => &self.user_logs,
            Table::PaidTransactions => &self.paid_transactions,
            Table::ReferralRewards => &self.referral_rewards,
            Table::UserReferralStatuses => &self.user_referral_statuses,
            Table::LeadLog => &self.lead_log,
        }
    }

    /// Tables paired with their identity, in load order.
    pub fn iter(&self) -> impl Iterator<Item = (Table, &DataFrame)> {
        Table::ALL.into_iter().map(move |table| (table, self.get(table)))
    }

    /// Rebuilds every table through `f`, stopping at the first error.
    pub fn try_map<E>(
        self,
        mut f: impl FnMut(Table, DataFrame) -> Result<DataFrame, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            user_referrals: f(Table::UserReferrals, self.user_referrals)?,
            user_referral_logs: f(Table::UserReferralLogs, self.user_referral_logs)?,
            user_logs: f(Table::UserLogs, self.user_logs)?,
            paid_transactions: f(Table::PaidTransactions, self.paid_transactions)?,
            referral_rewards: f(Table::ReferralRewards, self.referral_rewards)?,
            user_referral_statuses: f(Table::UserReferralStatuses, self.user_referral_statuses)?,
            lead_log: f(Table::LeadLog, self.lead_log)?,
        })
    }
}

/// Loads every input from `data_dir`. The first missing or malformed file aborts the load.
pub fn load_all(data_dir: &Path) -> Result<Datasets, LoadError> {
    let datasets = Datasets {
        user_referrals: load_table(data_dir, Table::UserReferrals.spec())?,
        user_referral_logs: load_table(data_dir, Table::UserReferralLogs.spec())?,
        user_logs: load_table(data_dir, Table::UserLogs.spec())?,
        paid_transactions: load_table(data_dir, Table::PaidTransactions.spec())?,
        referral_rewards: load_table(data_dir, Table::ReferralRewards.spec())?,
        user_referral_statuses: load_table(data_dir, Table::UserReferralStatuses.spec())?,
        lead_log: load_table(data_dir, Table::LeadLog.spec())?,
    };
    info!("All CSV files loaded");
    Ok(datasets)
}

pub fn load_table(data_dir: &Path, spec: &TableSpec) -> Result<DataFrame, LoadError> {
    let path = data_dir.join(spec.file_name);
    info!(file = spec.file_name, "Loading table");

    // Whole-file read so the handle is released before parsing starts.
    let content = fs::read(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let df = read_csv_bytes(content).map_err(|source| LoadError::Csv {
        path: path.clone(),
        source,
    })?;

    if df.width() == 0 {
        return Err(LoadError::Empty { path });
    }

    info!(
        table = spec.name,
        rows = df.height(),
        columns = df.width(),
        "Loaded table"
    );
    Ok(df)
}

/// Parses comma-delimited text with a header row. Dates are left as text.
///
/// Column types are inferred from every row so a late non-numeric value widens the column
/// to text instead of failing the parse.
pub fn read_csv_bytes(content: Vec<u8>) -> PolarsResult<DataFrame> {
    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());
    let parse_options = CsvParseOptions::default().with_null_values(Some(null_values));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()
}
