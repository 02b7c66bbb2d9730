/// A mail exchanger candidate. Lower `priority` is tried first.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailTarget {
    pub host: String,
    pub priority: u16,
}

impl MailTarget {
    pub fn new(host: impl Into<String>, priority: u16) -> Self {
        Self {
            host: host.into(),
            priority,
        }
    }
}

impl std::fmt::Display for MailTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.priority, self.host)
    }
}
