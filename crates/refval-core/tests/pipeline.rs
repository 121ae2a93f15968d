use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use refval_core::loader::load_all;
use refval_core::pipeline::{profile_all, run, PipelineConfig};
use refval_core::reporter::FINAL_COLUMNS;
use refval_core::{LoadError, PipelineError};

const USER_REFERRALS: &str = "\
referral_id,referrer_id,referee_id,referee_name,referee_phone,referral_source,referral_at,user_referral_status_id,referral_reward_id,transaction_id,updated_at
r1,u1,lead-9,budi santoso,phone-1,user sign up,2024-05-01 09:00:00,1,1,tx1,2024-05-01 09:00:00
r2,u1,lead-8,sari,phone-2,Draft Transaction,2024-05-20 09:00:00,1,1,tx2,2024-05-20 09:00:00
r3,u2,lead-1,andi,phone-3,LEAD,2024-05-03 09:00:00,2,,,2024-05-03 09:00:00
r4,,lead-2,dewi,phone-4,Lead,2024-05-04 09:00:00,2,,,2024-05-04 09:00:00
,u2,lead-3,eko,phone-5,Lead,2024-05-05 09:00:00,2,,,2024-05-05 09:00:00
r1,u1,lead-9,budi santoso,phone-1,user sign up,2024-05-01 09:00:00,1,1,tx1,2024-05-01 09:00:00
";

const USER_REFERRAL_STATUSES: &str = "\
id,description,is_reward_granted,created_at
1,berhasil,true,2024-01-01 00:00:00
2,menunggu,false,2024-01-01 00:00:00
";

const REFERRAL_REWARDS: &str = "\
id,reward_value,created_at
1,\"20,000\",2024-01-01 00:00:00
";

const USER_LOGS: &str = "\
id,user_id,name,phone_number,homeclub,membership_expired_date,is_deleted
1,u1,john doe,phone-u1,JAKARTA pusat,2025-12-31,false
2,u2,jane roe,phone-u2,bandung,2025-12-31,
3,,ghost,phone-u3,bali,2025-12-31,true
";

const PAID_TRANSACTIONS: &str = "\
transaction_id,transaction_status,transaction_at,transaction_location,transaction_type
tx1,Paid,2024-05-02 10:00:00+07:00,jakarta,New
tx2,paid,2024-06-02 10:00:00,bandung,new
";

const USER_REFERRAL_LOGS: &str = "\
id,user_referral_id,source_transaction_id,created_at
1,r1,tx1,2024-05-02 11:00:00
2,r1,tx1,2024-05-03 11:00:00
3,r2,tx2,2024-06-02 11:00:00
";

const LEAD_LOG: &str = "\
id,lead_id,source_category,created_at
1,lead-1,organic,2024-04-01 00:00:00
";

fn write_fixtures(dir: &Path) -> Result<()> {
    for (file, content) in [
        ("user_referrals.csv", USER_REFERRALS),
        ("user_referral_logs.csv", USER_REFERRAL_LOGS),
        ("user_logs.csv", USER_LOGS),
        ("paid_transactions.csv", PAID_TRANSACTIONS),
        ("referral_rewards.csv", REFERRAL_REWARDS),
        ("user_referral_statuses.csv", USER_REFERRAL_STATUSES),
        ("lead_log.csv", LEAD_LOG),
    ] {
        fs::write(dir.join(file), content)?;
    }
    Ok(())
}

fn config_in(root: &TempDir) -> PipelineConfig {
    PipelineConfig {
        data_dir: root.path().join("data"),
        profiling_dir: root.path().join("profiling"),
        output_dir: root.path().join("output"),
    }
}

fn read_output(path: &Path) -> Result<(Vec<String>, Vec<HashMap<String, String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }
    Ok((headers, rows))
}

#[test]
fn end_to_end_run_writes_validated_referrals() -> Result<()> {
    let root = tempfile::tempdir()?;
    let config = config_in(&root);
    fs::create_dir_all(&config.data_dir)?;
    write_fixtures(&config.data_dir)?;

    let summary = run(&config)?;

    assert_eq!(summary.input_rows.len(), 7);
    assert_eq!(summary.input_rows[0].table, "user_referrals");
    assert_eq!(summary.input_rows[0].rows, 6);
    assert_eq!(summary.output_rows, 3);
    assert_eq!(summary.valid_rows, 2);
    assert_eq!(summary.invalid_rows, 1);
    assert!(summary.profiling_report.exists());
    assert!(summary.output_file.exists());

    let (headers, rows) = read_output(&summary.output_file)?;
    assert_eq!(headers, FINAL_COLUMNS.to_vec());

    let ids: Vec<&str> = rows.iter().map(|row| row["referral_id"].as_str()).collect();
    assert_eq!(ids, vec!["R1", "R2", "R3"]);

    let r1 = &rows[0];
    assert_eq!(r1["referral_source"], "User Sign Up");
    assert_eq!(r1["referral_source_category"], "Online");
    assert_eq!(r1["referrer_name"], "John Doe");
    assert_eq!(r1["referrer_homeclub"], "JAKARTA pusat");
    assert_eq!(r1["description"], "Berhasil");
    assert_eq!(r1["reward_value"].parse::<f64>()?, 20_000.0);
    assert_eq!(r1["transaction_status"], "PAID");
    assert_eq!(r1["transaction_type"], "NEW");
    assert_eq!(r1["transaction_at"], "2024-05-02 03:00:00");
    assert_eq!(r1["referral_at"], "2024-05-01 09:00:00");
    assert_eq!(r1["is_business_logic_valid"], "true");
    assert_eq!(r1["updated_at"], "2024-05-01 09:00:00+00:00");
    assert_eq!(r1["created_at"], "");

    let r2 = &rows[1];
    assert_eq!(r2["referral_source_category"], "Offline");
    assert_eq!(r2["is_business_logic_valid"], "false");

    let r3 = &rows[2];
    assert_eq!(r3["referral_source"], "Lead");
    assert_eq!(r3["referral_source_category"], "Organic");
    assert_eq!(r3["description"], "Menunggu");
    assert_eq!(r3["reward_value"], "");
    assert_eq!(r3["transaction_status"], "NAN");
    assert_eq!(r3["created_at"], "2024-04-01 00:00:00+00:00");
    assert_eq!(r3["is_business_logic_valid"], "true");
    Ok(())
}

#[test]
fn missing_input_aborts_before_any_output() -> Result<()> {
    let root = tempfile::tempdir()?;
    let config = config_in(&root);
    fs::create_dir_all(&config.data_dir)?;

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::Io { .. })));
    assert!(!config.profiling_report_path().exists());
    assert!(!config.output_path().exists());
    Ok(())
}

#[test]
fn empty_file_is_rejected() -> Result<()> {
    let root = tempfile::tempdir()?;
    let data_dir = root.path();
    write_fixtures(data_dir)?;
    fs::write(data_dir.join("lead_log.csv"), "")?;

    let err = load_all(data_dir).unwrap_err();
    assert!(matches!(err, LoadError::Empty { .. } | LoadError::Csv { .. }));
    Ok(())
}

#[test]
fn profiling_covers_every_raw_column() -> Result<()> {
    let root = tempfile::tempdir()?;
    write_fixtures(root.path())?;

    let datasets = load_all(root.path())?;
    let profiler = profile_all(&datasets)?;

    let expected: usize = datasets.iter().map(|(_, df)| df.width()).sum();
    assert_eq!(profiler.records().len(), expected);

    let referral_ids = profiler
        .records()
        .iter()
        .find(|record| record.table == "user_referrals" && record.column == "referral_id")
        .expect("referral_id profiled");
    assert_eq!(referral_ids.null_count, 1);
    assert_eq!(referral_ids.distinct_count, 4);
    Ok(())
}
