//! Range-checked parsers for numeric command-line options.

use pdp_extract::extraction::{check_budget, check_max_attempts};

/// Parses `--budget` as a finite USD amount above zero.
///
/// # Errors
/// Returns a message for clap when the value is not a number or out of range.
pub fn parse_budget(value: &str) -> Result<f64, String> {
    let budget = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    check_budget(budget).map_err(|e| e.to_string())
}

/// Parses `--max-attempts` as a count of at least one.
///
/// # Errors
/// Returns a message for clap when the value is not a count or is zero.
pub fn parse_max_attempts(value: &str) -> Result<usize, String> {
    let max = value
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("`{value}` is not a whole number: {e}"))?;
    check_max_attempts(max).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn budget_accepts_positive_amounts() {
        assert!((parse_budget("1.0").unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((parse_budget(" 0.25 ").unwrap() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn budget_rejects_values_without_a_ceiling() {
        for value in ["NaN", "inf", "-inf", "-1", "0", "free"] {
            assert!(parse_budget(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn max_attempts_must_allow_one_call() {
        assert_eq!(parse_max_attempts("5"), Ok(5));
        assert_eq!(parse_max_attempts("1"), Ok(1));
        assert!(parse_max_attempts("0").is_err());
        assert!(parse_max_attempts("-2").is_err());
    }
}
