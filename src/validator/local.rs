/// atext ASCII + '.' non initial/terminal, pas de ".."
pub(crate) fn check_local(local: &str, reasons: &mut Vec<String>) {
    if local.is_empty() || local.len() > 64 {
        reasons.push(format!(
            "local part length {} invalid (1..=64)",
            local.len()
        ));
    }
    if local.starts_with('.') || local.ends_with('.') {
        reasons.push("local part cannot start/end with '.'".to_string());
    }
    if local.contains("..") {
        reasons.push("local part contains consecutive dots".to_string());
    }
    if !local.chars().all(is_atext_or_dot) {
        reasons.push("local part has invalid chars".to_string());
    }
}

fn is_atext_or_dot(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '.'
        )
}
