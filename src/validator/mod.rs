mod domain;
mod local;
mod types;

pub use types::{NormalizedEmail, ValidationReport};

use std::sync::LazyLock;

use regex::Regex;

use domain::check_domain;
use local::check_local;

const MAX_ADDRESS_LEN: usize = 254;

static ADDRESS_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .expect("address grammar is a valid regex")
});

pub fn validate_email(email: &str) -> ValidationReport {
    let normalized = normalize_email(email);
    ValidationReport {
        ok: normalized.valid,
        reasons: normalized.reasons,
    }
}

/// Valide et renvoie une *sortie normalisée*
/// (local, domaine en minuscules, domaine ASCII).
///
/// Every failing rule is reported; the grammar regex runs last, against the
/// ASCII form, so it only adds a reason when the targeted checks missed one.
pub fn normalize_email(email: &str) -> NormalizedEmail {
    let input = email.trim();
    let mut reasons = Vec::new();

    if input.is_empty() {
        reasons.push("email is empty".to_string());
    } else if input.len() > MAX_ADDRESS_LEN {
        reasons.push(format!("total length {} > {MAX_ADDRESS_LEN}", input.len()));
    }

    let Some((local, domain)) = input.split_once('@').filter(|(_, d)| !d.contains('@')) else {
        reasons.push("must contain exactly one '@'".to_string());
        return NormalizedEmail {
            original: email.to_string(),
            local: String::new(),
            domain: String::new(),
            ascii_domain: String::new(),
            valid: false,
            reasons,
        };
    };

    check_local(local, &mut reasons);
    let ascii_domain = check_domain(domain, &mut reasons);

    if reasons.is_empty() && !ADDRESS_GRAMMAR.is_match(&format!("{local}@{ascii_domain}")) {
        reasons.push("address does not match the RFC 5322 subset".to_string());
    }

    NormalizedEmail {
        original: email.to_string(),
        local: local.to_string(),
        domain: domain.to_lowercase(),
        ascii_domain,
        valid: reasons.is_empty(),
        reasons,
    }
}
