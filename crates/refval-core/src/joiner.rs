use std::collections::HashSet;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::loader::Datasets;
use crate::tables::Table;

/// Left/right suffixes for colliding column names when a step names none.
pub const DEFAULT_SUFFIXES: (&str, &str) = ("_x", "_y");
/// The reward join keeps left names and only tags the reward side.
pub const REWARD_SUFFIXES: (&str, &str) = ("", "_reward");

/// One left join onto the running referral table.
#[derive(Debug, Clone, Copy)]
pub struct JoinStep {
    pub right: Table,
    pub left_on: &'static str,
    pub right_on: &'static str,
    /// Applied to every right-side column before joining.
    pub right_prefix: Option<&'static str>,
    pub suffixes: (&'static str, &'static str),
}

pub const JOIN_PLAN: [JoinStep; 6] = [
    JoinStep {
        right: Table::UserReferralStatuses,
        left_on: "user_referral_status_id",
        right_on: "id",
        right_prefix: None,
        suffixes: DEFAULT_SUFFIXES,
    },
    JoinStep {
        right: Table::ReferralRewards,
        left_on: "referral_reward_id",
        right_on: "id",
        right_prefix: None,
        suffixes: REWARD_SUFFIXES,
    },
    JoinStep {
        right: Table::UserLogs,
        left_on: "referrer_id",
        right_on: "referrer_user_id",
        right_prefix: Some("referrer_"),
        suffixes: DEFAULT_SUFFIXES,
    },
    JoinStep {
        right: Table::PaidTransactions,
        left_on: "transaction_id",
        right_on: "transaction_id",
        right_prefix: None,
        suffixes: DEFAULT_SUFFIXES,
    },
    JoinStep {
        right: Table::UserReferralLogs,
        left_on: "referral_id",
        right_on: "user_referral_id",
        right_prefix: None,
        suffixes: DEFAULT_SUFFIXES,
    },
    JoinStep {
        right: Table::LeadLog,
        left_on: "referee_id",
        right_on: "lead_id",
        right_prefix: None,
        suffixes: DEFAULT_SUFFIXES,
    },
];

pub const DEDUP_KEY: &str = "referral_id";

/// Chains every join of [`JOIN_PLAN`] onto the referral table, then keeps the first row
/// seen for each referral.
pub fn join_all(datasets: &Datasets) -> Result<DataFrame> {
    let mut joined = datasets.get(Table::UserReferrals).clone();

    for step in JOIN_PLAN.iter() {
        let mut right = datasets.get(step.right).clone();
        if let Some(prefix) = step.right_prefix {
            right = add_prefix(right, prefix)?;
        }

        require_column(&joined, Table::UserReferrals.name(), step.left_on)?;
        require_column(&right, step.right.name(), step.right_on)?;

        let rows_before = joined.height();
        joined = left_join(&joined, &right, step.left_on, step.right_on, step.suffixes)?;
        debug!(
            right = step.right.name(),
            left_on = step.left_on,
            right_on = step.right_on,
            rows_before,
            rows_after = joined.height(),
            "Joined table"
        );
    }

    let deduplicated = dedup_first(joined, DEDUP_KEY)?;
    info!(rows = deduplicated.height(), "All joins completed");
    Ok(deduplicated)
}

pub fn add_prefix(mut df: DataFrame, prefix: &str) -> PolarsResult<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| format!("{prefix}{name}"))
        .collect();
    df.set_column_names(names.iter().map(|s| s.as_str()))?;
    Ok(df)
}

/// Left join that keeps the left row order, with right matches in right-table order.
///
/// Null keys never match. A key name shared by both sides is kept once; otherwise both key
/// columns survive. Every other name present on both sides is renamed on each side with
/// `suffixes` (an empty suffix leaves that side alone).
pub fn left_join(
    left: &DataFrame,
    right: &DataFrame,
    left_on: &str,
    right_on: &str,
    suffixes: (&str, &str),
) -> Result<DataFrame> {
    let mut left = left.clone();
    let mut right = right.clone();
    let (left_key, right_key) =
        rename_overlaps(&mut left, &mut right, left_on, right_on, suffixes)?;
    align_key_dtypes(&mut left, &mut right, &left_key, &right_key)?;

    let coalesce = if left_key == right_key {
        JoinCoalesce::CoalesceColumns
    } else {
        JoinCoalesce::KeepColumns
    };
    let mut args = JoinArgs::new(JoinType::Left).with_coalesce(coalesce);
    args.maintain_order = MaintainOrderJoin::LeftRight;

    let joined = left
        .lazy()
        .join(
            right.lazy(),
            [col(left_key.as_str())],
            [col(right_key.as_str())],
            args,
        )
        .collect()?;
    Ok(joined)
}

/// Keeps the first row for every distinct value of `key`, preserving row order.
pub fn dedup_first(df: DataFrame, key: &str) -> Result<DataFrame> {
    require_column(&df, "joined", key)?;
    let deduplicated = df
        .lazy()
        .unique_stable(Some(vec![key.into()]), UniqueKeepStrategy::First)
        .collect()?;
    Ok(deduplicated)
}

/// Applies the collision suffixes in place and returns the (possibly renamed) key names.
fn rename_overlaps(
    left: &mut DataFrame,
    right: &mut DataFrame,
    left_on: &str,
    right_on: &str,
    (left_suffix, right_suffix): (&str, &str),
) -> PolarsResult<(String, String)> {
    let left_names: Vec<String> = left
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let right_names: HashSet<String> = right
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut taken: HashSet<String> = left_names.iter().cloned().collect();
    taken.extend(right_names.iter().cloned());

    let mut left_key = left_on.to_string();
    let mut right_key = right_on.to_string();

    for name in left_names {
        if !right_names.contains(&name) || (name == left_on && left_on == right_on) {
            continue;
        }

        if !left_suffix.is_empty() {
            let renamed = unique_name(&name, left_suffix, &taken);
            left.rename(&name, renamed.as_str().into())?;
            if name == left_key {
                left_key = renamed.clone();
            }
            taken.insert(renamed);
        }
        if !right_suffix.is_empty() {
            let renamed = unique_name(&name, right_suffix, &taken);
            right.rename(&name, renamed.as_str().into())?;
            if name == right_key {
                right_key = renamed.clone();
            }
            taken.insert(renamed);
        }
    }
    // polars 0.48 `DataFrame::rename` leaves the cached schema stale.
    left.clear_schema();
    right.clear_schema();
    Ok((left_key, right_key))
}

fn unique_name(name: &str, suffix: &str, taken: &HashSet<String>) -> String {
    let suffixed = format!("{name}{suffix}");
    if !taken.contains(&suffixed) {
        return suffixed;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{suffixed}_{counter}");
        if !taken.contains(&candidate) {
            warn!(column = name, renamed = %candidate, "suffixed name already taken");
            return candidate;
        }
        counter += 1;
    }
}

/// Casts both key columns to one comparable dtype when inference typed them differently.
fn align_key_dtypes(
    left: &mut DataFrame,
    right: &mut DataFrame,
    left_key: &str,
    right_key: &str,
) -> PolarsResult<()> {
    let left_dtype = left.column(left_key)?.dtype().clone();
    let right_dtype = right.column(right_key)?.dtype().clone();
    if left_dtype == right_dtype {
        return Ok(());
    }

    let common = common_key_dtype(&left_dtype, &right_dtype);
    let cast = left.column(left_key)?.cast(&common)?;
    left.with_column(cast)?;
    let cast = right.column(right_key)?.cast(&common)?;
    right.with_column(cast)?;
    Ok(())
}

fn common_key_dtype(left: &DataType, right: &DataType) -> DataType {
    let numeric = |dtype: &DataType| dtype.is_integer() || dtype.is_float() || dtype.is_null();
    if !numeric(left) || !numeric(right) {
        DataType::String
    } else if left.is_float() || right.is_float() {
        DataType::Float64
    } else {
        DataType::Int64
    }
}

fn require_column(df: &DataFrame, table: &str, column: &str) -> Result<()> {
    if df.column(column).is_err() {
        return Err(PipelineError::missing_column(table, column));
    }
    Ok(())
}
