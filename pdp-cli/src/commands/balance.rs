use crate::errors::CliError;
use openrouter_adapter::{KeyInfo, OpenRouterClient};
use std::fmt::Write;

/// Prints spend and remaining credit for the configured key.
///
/// # Errors
/// Returns an error if the key endpoint cannot be reached or decoded.
pub async fn run(client: &OpenRouterClient) -> Result<KeyInfo, CliError> {
    let info = client.key_info().await?;
    print!("{}", format_balance(&info));
    Ok(info)
}

/// Renders key usage as a short report.
#[must_use]
pub fn format_balance(info: &KeyInfo) -> String {
    let mut report = String::new();
    let _ = writeln!(
        report,
        "OpenRouter - {}",
        info.label.as_deref().unwrap_or("API key")
    );
    let _ = writeln!(report, "  Used:    ${:.2}", info.usage);
    if let Some(limit) = info.limit {
        let _ = writeln!(report, "  Limit:   ${limit:.2}");
    }
    match info.limit_remaining {
        Some(left) => {
            let _ = writeln!(report, "  Left:    ${left:.2}");
        }
        None => {
            let _ = writeln!(report, "  Left:    (no limit)");
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_key() {
        let info = KeyInfo {
            label: Some("ci".to_string()),
            usage: 3.456,
            limit: Some(10.0),
            limit_remaining: Some(6.544),
        };
        assert_eq!(
            format_balance(&info),
            "OpenRouter - ci\n  Used:    $3.46\n  Limit:   $10.00\n  Left:    $6.54\n"
        );
    }

    #[test]
    fn unlimited_key() {
        let report = format_balance(&KeyInfo::default());
        assert!(report.starts_with("OpenRouter - API key\n"));
        assert!(report.contains("  Used:    $0.00\n"));
        assert!(!report.contains("Limit:"));
        assert!(report.ends_with("  Left:    (no limit)\n"));
    }
}
