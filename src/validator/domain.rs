const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Converts the domain to its ASCII (punycode) form and records every
/// structural problem in `reasons`. Returns an empty string when IDNA
/// conversion itself fails.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) -> String {
    let Ok(ascii) = idna::domain_to_ascii(domain) else {
        reasons.push("domain punycode conversion failed".to_string());
        return String::new();
    };
    if ascii.is_empty() {
        reasons.push("domain empty after IDNA conversion".to_string());
        return ascii;
    }

    if ascii.len() > MAX_DOMAIN_LEN {
        reasons.push(format!("domain length {} > {MAX_DOMAIN_LEN}", ascii.len()));
    }
    if !ascii.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }
    reasons.extend(ascii.split('.').flat_map(label_problems));

    ascii
}

fn label_problems(label: &str) -> Vec<String> {
    if label.is_empty() {
        return vec!["empty domain label".to_string()];
    }
    let mut problems = Vec::new();
    if label.len() > MAX_LABEL_LEN {
        problems.push(format!("domain label '{label}' length {} > {MAX_LABEL_LEN}", label.len()));
    }
    if label.starts_with('-') || label.ends_with('-') {
        problems.push(format!("domain label '{label}' cannot start/end with '-'"));
    }
    if label.bytes().any(|b| !(b.is_ascii_alphanumeric() || b == b'-')) {
        problems.push(format!("domain label '{label}' has invalid chars"));
    }
    problems
}
