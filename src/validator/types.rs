#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// Address split into its parts, with the domain lowered and converted to
/// its ASCII (punycode) form for DNS and SMTP use.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmail {
    pub original: String,
    pub local: String,
    pub domain: String,
    pub ascii_domain: String,
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl NormalizedEmail {
    /// `local@ascii_domain`, the form sent in `RCPT TO`.
    pub fn ascii_address(&self) -> String {
        format!("{}@{}", self.local, self.ascii_domain)
    }
}
