use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use refval_core::columns::datetime_series;
use refval_core::validator::{apply_business_rules, ReferralRow, IS_BUSINESS_LOGIC_VALID};

fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

fn successful_referral() -> ReferralRow {
    ReferralRow {
        reward_value: Some(20_000.0),
        description: Some("Berhasil".to_string()),
        transaction_status: Some("PAID".to_string()),
        transaction_type: Some("NEW".to_string()),
        transaction_at: Some(at(2024, 5, 10, 12)),
        referral_at: Some(at(2024, 5, 1, 9)),
        referrer_is_deleted: Some(false),
        referrer_membership_expired_date: Some(at(2024, 12, 31, 0)),
        is_reward_granted: Some(true),
    }
}

#[test]
fn paid_referral_in_same_month_is_valid() {
    let row = successful_referral();
    assert!(row.is_valid_success());
    assert!(row.is_business_logic_valid());
}

#[test]
fn success_fails_on_any_broken_condition() {
    let cases: Vec<(&str, ReferralRow)> = vec![
        (
            "next month",
            ReferralRow {
                transaction_at: Some(at(2024, 6, 2, 12)),
                ..successful_referral()
            },
        ),
        (
            "same month next year",
            ReferralRow {
                transaction_at: Some(at(2025, 5, 2, 12)),
                ..successful_referral()
            },
        ),
        (
            "transaction before referral",
            ReferralRow {
                transaction_at: Some(at(2024, 5, 1, 8)),
                ..successful_referral()
            },
        ),
        (
            "zero reward",
            ReferralRow {
                reward_value: Some(0.0),
                ..successful_referral()
            },
        ),
        (
            "unpaid",
            ReferralRow {
                transaction_status: Some("PENDING".to_string()),
                ..successful_referral()
            },
        ),
        (
            "renewal",
            ReferralRow {
                transaction_type: Some("RENEWAL".to_string()),
                ..successful_referral()
            },
        ),
        (
            "deleted referrer",
            ReferralRow {
                referrer_is_deleted: Some(true),
                ..successful_referral()
            },
        ),
        (
            "expired membership",
            ReferralRow {
                referrer_membership_expired_date: Some(at(2024, 5, 9, 0)),
                ..successful_referral()
            },
        ),
        (
            "reward not granted",
            ReferralRow {
                is_reward_granted: Some(false),
                ..successful_referral()
            },
        ),
        (
            "unknown deletion flag",
            ReferralRow {
                referrer_is_deleted: None,
                ..successful_referral()
            },
        ),
        (
            "unknown transaction time",
            ReferralRow {
                transaction_at: None,
                ..successful_referral()
            },
        ),
    ];

    for (label, row) in cases {
        assert!(!row.is_business_logic_valid(), "{label} should be invalid");
    }
}

#[test]
fn membership_expiring_on_transaction_day_is_still_valid() {
    let row = ReferralRow {
        referrer_membership_expired_date: Some(at(2024, 5, 10, 12)),
        ..successful_referral()
    };
    assert!(row.is_valid_success());
}

#[test]
fn pending_or_failed_without_reward_is_valid() {
    for description in ["Menunggu", "Tidak Berhasil"] {
        let row = ReferralRow {
            description: Some(description.to_string()),
            ..ReferralRow::default()
        };
        assert!(row.is_valid_no_reward(), "{description}");
        assert!(row.is_business_logic_valid(), "{description}");
    }
}

#[test]
fn double_spaced_failure_is_not_a_no_reward_status() {
    let row = ReferralRow {
        description: Some("Tidak  Berhasil".to_string()),
        ..ReferralRow::default()
    };
    assert!(!row.is_valid_no_reward());
    assert!(!row.is_business_logic_valid());
}

#[test]
fn pending_with_reward_is_invalid() {
    let row = ReferralRow {
        reward_value: Some(10_000.0),
        description: Some("Menunggu".to_string()),
        ..ReferralRow::default()
    };
    assert!(!row.is_business_logic_valid());
}

#[test]
fn empty_row_is_invalid() {
    assert!(!ReferralRow::default().is_business_logic_valid());
}

#[test]
fn flags_are_added_per_row() -> PolarsResult<()> {
    let micros = |value: NaiveDateTime| Some(value.and_utc().timestamp_micros());
    let mut df = df![
        "referral_id" => ["R1", "R2", "R3"],
        "reward_value" => [Some(20_000.0f64), Some(20_000.0), None],
        "description" => ["Berhasil", "Berhasil", "Menunggu"],
        "transaction_status" => ["PAID", "PAID", "NAN"],
        "transaction_type" => ["NEW", "NEW", "NAN"],
        "referrer_is_deleted" => [false, false, false],
        "is_reward_granted" => [true, true, false],
    ]?;
    df.with_column(datetime_series(
        "transaction_at".into(),
        vec![micros(at(2024, 5, 10, 12)), micros(at(2024, 6, 2, 12)), None],
        false,
    )?)?;
    df.with_column(datetime_series(
        "referral_at".into(),
        vec![micros(at(2024, 5, 1, 9)); 3],
        false,
    )?)?;
    df.with_column(datetime_series(
        "referrer_membership_expired_date".into(),
        vec![micros(at(2024, 12, 31, 0)); 3],
        false,
    )?)?;

    let validated = apply_business_rules(df)?;
    let flags = validated.column(IS_BUSINESS_LOGIC_VALID)?.bool()?;
    assert_eq!(flags.get(0), Some(true));
    assert_eq!(flags.get(1), Some(false));
    assert_eq!(flags.get(2), Some(true));
    assert_eq!(flags.null_count(), 0);
    Ok(())
}

#[test]
fn missing_inputs_default_to_invalid() -> PolarsResult<()> {
    let df = df![
        "referral_id" => ["R1", "R2"],
    ]?;

    let validated = apply_business_rules(df)?;
    let flags = validated.column(IS_BUSINESS_LOGIC_VALID)?.bool()?;
    assert_eq!(flags.get(0), Some(false));
    assert_eq!(flags.get(1), Some(false));
    Ok(())
}
