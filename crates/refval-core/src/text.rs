/// Trims the ends and capitalizes the first letter of every whitespace-separated word.
///
/// Interior separators are kept as they are. The rest of each word is lowercased, so
/// applying it twice changes nothing.
pub fn title_case(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut word_start = true;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            out.push(ch);
            word_start = true;
        } else if word_start {
            out.extend(ch.to_uppercase());
            word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Reads a loosely formatted boolean flag (`true`, `T`, `yes`, `1`, ...).
/// Anything not recognized as true is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1" | "1.0"
    )
}

/// Strips thousands separators and parses the remainder as a number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
}
