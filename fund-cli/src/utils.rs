use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Error returned when a string is not a whole, non-negative number.
#[derive(Debug, Error)]
#[error("invalid count '{input}': {source}")]
pub struct ParseCountError {
    input: String,
    #[source]
    source: std::num::ParseIntError,
}

/// Trims whitespace and removes commas (thousands separator).
fn normalize_number_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a money amount.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_number_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::warn!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a count such as a campaign limit. Empty input is 0.
pub fn parse_count(s: &str) -> Result<u32, ParseCountError> {
    let normalized = normalize_number_input(s);
    if normalized.is_empty() {
        return Ok(0);
    }
    normalized.parse().map_err(|e| {
        tracing::warn!(input = %s, "invalid count: {}", e);
        ParseCountError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Optional text for display, "—" when missing or blank.
pub fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "—",
    }
}
