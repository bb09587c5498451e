/// Display settings for money amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    pub symbol: String,
    pub code: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl Currency {
    pub fn usd() -> Self {
        Self {
            symbol: "$".to_string(),
            code: "USD".to_string(),
        }
    }

    /// Currency for an ISO 4217 code. Codes without a known symbol are
    /// shown as the code itself, e.g. "HUF 12.00".
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        let sym = currency_symbol(&code);
        let symbol = if sym.is_empty() {
            format!("{} ", code)
        } else {
            sym.to_string()
        };
        Self { symbol, code }
    }

    /// Two-decimal amount with symbol. Non-finite amounts (from a degenerate
    /// margin) print as "n/a".
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return "n/a".to_string();
        }
        if amount < 0.0 && format!("{:.2}", -amount) != "0.00" {
            format!("-{}{:.2}", self.symbol, -amount)
        } else {
            format!("{}{:.2}", self.symbol, amount.abs())
        }
    }
}

/// Percentage with one decimal, "n/a" when non-finite.
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value)
    } else {
        "n/a".to_string()
    }
}

/// Unit counts: integers without decimals, fractions with up to two.
pub fn format_units(value: f64) -> String {
    if !value.is_finite() {
        "n/a".to_string()
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "¥",
        "KRW" => "₩",
        "INR" => "₹",
        "BRL" => "R$",
        "CHF" => "CHF ",
        "CAD" => "CA$",
        "AUD" => "A$",
        "SEK" => "kr ",
        "NOK" => "kr ",
        "DKK" => "kr ",
        "PLN" => "zł",
        "CZK" => "Kč ",
        "TRY" => "₺",
        "THB" => "฿",
        "MXN" => "MX$",
        "ZAR" => "R ",
        "VND" => "₫",
        "IDR" => "Rp ",
        "PHP" => "₱",
        _ => "",
    }
}
