//! Account snapshot record.

use serde::Serialize;

/// Canonical account state. Monetary fields are plain decimals; formatting
/// with currency symbol and thousands separators happens at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub account_number: String,
    pub status: String,
    pub equity: f64,
    pub buying_power: f64,
    pub cash: f64,
    pub portfolio_value: f64,
    pub daytrade_count: i64,
    pub currency: String,
}

impl AccountInfo {
    /// Boundary representation with formatted currency strings.
    pub fn to_report(&self) -> AccountReport {
        AccountReport {
            account_number: self.account_number.clone(),
            status: self.status.clone(),
            equity: format_usd(self.equity),
            buying_power: format_usd(self.buying_power),
            cash: format_usd(self.cash),
            portfolio_value: format_usd(self.portfolio_value),
            daytrade_count: self.daytrade_count,
            currency: self.currency.clone(),
        }
    }
}

/// Account snapshot as handed to API callers: fixed two-decimal currency
/// strings with thousands separators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    #[serde(rename = "Account Number")]
    pub account_number: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Equity")]
    pub equity: String,
    #[serde(rename = "Buying Power")]
    pub buying_power: String,
    #[serde(rename = "Cash")]
    pub cash: String,
    #[serde(rename = "Portfolio Value")]
    pub portfolio_value: String,
    #[serde(rename = "Daytrade Count")]
    pub daytrade_count: i64,
    #[serde(rename = "Currency")]
    pub currency: String,
}

/// Format a dollar amount as `$1,234.56` (`-$1,234.56` when negative).
pub fn format_usd(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}
