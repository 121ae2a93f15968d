use std::fmt;

use once_cell::sync::Lazy;

/// The seven inputs of a referral validation run, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserReferrals,
    UserReferralLogs,
    UserLogs,
    PaidTransactions,
    ReferralRewards,
    UserReferralStatuses,
    LeadLog,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::UserReferrals,
        Table::UserReferralLogs,
        Table::UserLogs,
        Table::PaidTransactions,
        Table::ReferralRewards,
        Table::UserReferralStatuses,
        Table::LeadLog,
    ];

    /// Position in load order, which is also the slot in the spec registry.
    pub const fn index(self) -> usize {
        match self {
            Table::UserReferrals => 0,
            Table::UserReferralLogs => 1,
            Table::UserLogs => 2,
            Table::PaidTransactions => 3,
            Table::ReferralRewards => 4,
            Table::UserReferralStatuses => 5,
            Table::LeadLog => 6,
        }
    }

    pub fn spec(self) -> &'static TableSpec {
        &TABLE_SPECS[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of how one input table is located and cleaned.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table: Table,
    pub name: &'static str,
    pub file_name: &'static str,
    /// Parsed as UTC timestamps; unparseable values become null.
    pub timestamp_columns: &'static [&'static str],
    /// Rows with a null in any of these are dropped.
    pub required_columns: &'static [&'static str],
    /// Null becomes `false`, everything else is cast to boolean.
    pub boolean_columns: &'static [&'static str],
    /// Text columns left exactly as loaded.
    pub title_case_exclusions: &'static [&'static str],
}

static TABLE_SPECS: Lazy<Vec<TableSpec>> = Lazy::new(|| {
    vec![
        TableSpec {
            table: Table::UserReferrals,
            name: "user_referrals",
            file_name: "user_referrals.csv",
            timestamp_columns: &["referral_at", "updated_at"],
            required_columns: &["referral_id", "referrer_id"],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
        TableSpec {
            table: Table::UserReferralLogs,
            name: "user_referral_logs",
            file_name: "user_referral_logs.csv",
            timestamp_columns: &["created_at"],
            required_columns: &[],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
        TableSpec {
            table: Table::UserLogs,
            name: "user_logs",
            file_name: "user_logs.csv",
            timestamp_columns: &["membership_expired_date"],
            required_columns: &["user_id"],
            boolean_columns: &["is_deleted"],
            title_case_exclusions: &["homeclub"],
        },
        TableSpec {
            table: Table::PaidTransactions,
            name: "paid_transactions",
            file_name: "paid_transactions.csv",
            timestamp_columns: &["transaction_at"],
            required_columns: &[],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
        TableSpec {
            table: Table::ReferralRewards,
            name: "referral_rewards",
            file_name: "referral_rewards.csv",
            timestamp_columns: &["created_at"],
            required_columns: &[],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
        TableSpec {
            table: Table::UserReferralStatuses,
            name: "user_referral_statuses",
            file_name: "user_referral_statuses.csv",
            timestamp_columns: &["created_at"],
            required_columns: &[],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
        TableSpec {
            table: Table::LeadLog,
            name: "lead_log",
            file_name: "lead_log.csv",
            timestamp_columns: &["created_at"],
            required_columns: &[],
            boolean_columns: &[],
            title_case_exclusions: &[],
        },
    ]
});

pub fn all_table_specs() -> &'static [TableSpec] {
    TABLE_SPECS.as_slice()
}
