//! NGN bank code directory.
//!
//! CBN-assigned bank codes used for recipient display on the payment page.
//! Account-name resolution against the bank is an external collaborator;
//! this table only maps codes to display names, falling back to the raw
//! code for anything unlisted.

pub const BANKS: &[(&str, &str)] = &[
    ("044", "Access Bank"),
    ("063", "Access Bank (Diamond)"),
    ("035A", "ALAT by WEMA"),
    ("023", "Citibank Nigeria"),
    ("050", "Ecobank Nigeria"),
    ("070", "Fidelity Bank"),
    ("011", "First Bank of Nigeria"),
    ("214", "First City Monument Bank"),
    ("058", "Guaranty Trust Bank"),
    ("030", "Heritage Bank"),
    ("301", "Jaiz Bank"),
    ("082", "Keystone Bank"),
    ("526", "Parallex Bank"),
    ("076", "Polaris Bank"),
    ("101", "Providus Bank"),
    ("221", "Stanbic IBTC Bank"),
    ("068", "Standard Chartered Bank"),
    ("232", "Sterling Bank"),
    ("100", "Suntrust Bank"),
    ("032", "Union Bank of Nigeria"),
    ("033", "United Bank For Africa"),
    ("215", "Unity Bank"),
    ("035", "Wema Bank"),
    ("057", "Zenith Bank"),
];

/// Look up the display name for a bank code.
pub fn bank_name(code: &str) -> Option<&'static str> {
    BANKS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Display name with fallback to the raw code for unlisted banks.
pub fn bank_display(code: &str) -> String {
    bank_name(code).map(str::to_string).unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(bank_name("057"), Some("Zenith Bank"));
        assert_eq!(bank_name("058"), Some("Guaranty Trust Bank"));
        assert_eq!(bank_name("044"), Some("Access Bank"));
    }

    #[test]
    fn test_unknown_code_falls_back_to_raw() {
        assert_eq!(bank_name("999"), None);
        assert_eq!(bank_display("999"), "999");
        assert_eq!(bank_display("057"), "Zenith Bank");
    }
}
