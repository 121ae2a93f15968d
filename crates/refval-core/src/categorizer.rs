use polars::prelude::*;

pub const REFERRAL_SOURCE_CATEGORY: &str = "referral_source_category";

/// `referral_source_category` expression. Source labels are compared in their title-cased
/// form; anything unrecognized maps to null.
pub fn source_category_expr(source: Expr, lead_category: Expr) -> Expr {
    when(source.clone().eq(lit("User Sign Up")))
        .then(lit("Online"))
        .when(source.clone().eq(lit("Draft Transaction")))
        .then(lit("Offline"))
        .when(source.eq(lit("Lead")))
        .then(lead_category)
        .otherwise(lit(NULL).cast(DataType::String))
        .alias(REFERRAL_SOURCE_CATEGORY)
}

/// Adds `referral_source_category` from `referral_source` and the joined lead `source_category`.
pub fn categorize_sources(df: DataFrame) -> PolarsResult<DataFrame> {
    let source = text_or_null(&df, "referral_source");
    let lead_category = text_or_null(&df, "source_category");

    df.lazy()
        .with_column(source_category_expr(source, lead_category))
        .collect()
}

fn text_or_null(df: &DataFrame, name: &str) -> Expr {
    if df.column(name).is_ok() {
        col(name).cast(DataType::String)
    } else {
        lit(NULL).cast(DataType::String)
    }
}
