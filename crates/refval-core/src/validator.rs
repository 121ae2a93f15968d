use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;
use tracing::info;

use crate::columns::{bools, floats, strings, timestamps};
use crate::timestamps::naive_from_micros;

pub const IS_BUSINESS_LOGIC_VALID: &str = "is_business_logic_valid";

const SUCCESS_DESCRIPTION: &str = "Berhasil";
const NO_REWARD_DESCRIPTIONS: [&str; 2] = ["Menunggu", "Tidak Berhasil"];

/// The fields of one joined referral the business rule looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferralRow {
    pub reward_value: Option<f64>,
    pub description: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_type: Option<String>,
    pub transaction_at: Option<NaiveDateTime>,
    pub referral_at: Option<NaiveDateTime>,
    pub referrer_is_deleted: Option<bool>,
    pub referrer_membership_expired_date: Option<NaiveDateTime>,
    pub is_reward_granted: Option<bool>,
}

impl ReferralRow {
    /// A paid, new transaction in the referral's month by a live member, with a granted
    /// positive reward.
    pub fn is_valid_success(&self) -> bool {
        let (Some(reward), Some(transaction_at), Some(referral_at), Some(expires_at)) = (
            self.reward_value,
            self.transaction_at,
            self.referral_at,
            self.referrer_membership_expired_date,
        ) else {
            return false;
        };

        reward > 0.0
            && self.description.as_deref() == Some(SUCCESS_DESCRIPTION)
            && self.transaction_status.as_deref() == Some("PAID")
            && self.transaction_type.as_deref() == Some("NEW")
            && transaction_at > referral_at
            && same_month(transaction_at, referral_at)
            && self.referrer_is_deleted == Some(false)
            && expires_at >= transaction_at
            && self.is_reward_granted == Some(true)
    }

    /// A pending or failed referral that correctly carries no reward.
    pub fn is_valid_no_reward(&self) -> bool {
        self.reward_value.is_none()
            && self
                .description
                .as_deref()
                .is_some_and(|description| NO_REWARD_DESCRIPTIONS.contains(&description))
    }

    pub fn is_business_logic_valid(&self) -> bool {
        self.is_valid_success() || self.is_valid_no_reward()
    }
}

fn same_month(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Reads the rule inputs of every row. Absent columns read as null.
pub fn referral_rows(df: &DataFrame) -> PolarsResult<Vec<ReferralRow>> {
    let reward_values = floats(df, "reward_value")?;
    let descriptions = strings(df, "description")?;
    let statuses = strings(df, "transaction_status")?;
    let types = strings(df, "transaction_type")?;
    let transaction_at = timestamps(df, "transaction_at")?;
    let referral_at = timestamps(df, "referral_at")?;
    let deleted = bools(df, "referrer_is_deleted")?;
    let expires_at = timestamps(df, "referrer_membership_expired_date")?;
    let granted = bools(df, "is_reward_granted")?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        rows.push(ReferralRow {
            reward_value: reward_values[idx],
            description: descriptions[idx].clone(),
            transaction_status: statuses[idx].clone(),
            transaction_type: types[idx].clone(),
            transaction_at: transaction_at[idx].and_then(naive_from_micros),
            referral_at: referral_at[idx].and_then(naive_from_micros),
            referrer_is_deleted: deleted[idx],
            referrer_membership_expired_date: expires_at[idx].and_then(naive_from_micros),
            is_reward_granted: granted[idx],
        });
    }
    Ok(rows)
}

/// Adds the `is_business_logic_valid` flag. Rows default to invalid.
pub fn apply_business_rules(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let flags: Vec<bool> = referral_rows(&df)?
        .iter()
        .map(ReferralRow::is_business_logic_valid)
        .collect();
    let valid = flags.iter().filter(|flag| **flag).count();

    df.with_column(Series::new(IS_BUSINESS_LOGIC_VALID.into(), flags))?;
    info!(valid, invalid = df.height() - valid, "Business logic applied");
    Ok(df)
}
