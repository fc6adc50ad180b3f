//! Supported currencies for the conversion wizard

/// Currency codes and display names, in menu order
pub const SUPPORTED_CURRENCIES: &[(&str, &str)] = &[
    ("AED", "United Arab Emirates Dirham"),
    ("BTC", "Bitcoin"),
    ("BYN", "New Belarusian Ruble"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Yuan"),
    ("EUR", "Euro"),
    ("GBP", "British Pound Sterling"),
    ("GEL", "Georgian Lari"),
    ("KGS", "Kyrgystani Som"),
    ("KZT", "Kazakhstani Tenge"),
    ("RUB", "Russian Ruble"),
    ("UAH", "Ukrainian Hryvnia"),
    ("USD", "United States Dollar"),
    ("XAU", "Gold (troy ounce)"),
];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_CURRENCIES.iter().any(|(c, _)| *c == code)
}

/// Human-readable name for a code
pub fn display_name(code: &str) -> Option<&'static str> {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Parse a user-typed amount, accepting both `.` and `,` as the fractional separator
pub fn parse_amount(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}
