//! Static membership lists consulted before any network work: disposable
//! domains and role-based local parts.
//!
//! Lists are exact-match on the lowercased key. Callers supply their own maps
//! (loaded however they like) or start from [`StaticLists::builtin`].

use std::collections::HashMap;

use phf::phf_set;

static BUILTIN_DISPOSABLE: phf::Set<&'static str> = phf_set! {
    "10minutemail.com",
    "guerrillamail.com",
    "mailinator.com",
    "tempmail.org",
    "throwaway.email",
    "yopmail.com",
    "temp-mail.org",
    "getairmail.com",
    "sharklasers.com",
};

static BUILTIN_ROLE_ACCOUNTS: phf::Set<&'static str> = phf_set! {
    "abuse",
    "admin",
    "billing",
    "contact",
    "help",
    "hostmaster",
    "info",
    "marketing",
    "noc",
    "no-reply",
    "noreply",
    "postmaster",
    "sales",
    "security",
    "support",
    "webmaster",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLists {
    disposable: HashMap<String, bool>,
    role_based: HashMap<String, bool>,
}

impl StaticLists {
    /// Builds lists from caller-supplied membership maps. Keys are lowercased.
    pub fn new(disposable: HashMap<String, bool>, role_based: HashMap<String, bool>) -> Self {
        Self {
            disposable: lowercase_keys(disposable),
            role_based: lowercase_keys(role_based),
        }
    }

    pub fn builtin() -> Self {
        Self {
            disposable: BUILTIN_DISPOSABLE
                .iter()
                .map(|domain| (domain.to_string(), true))
                .collect(),
            role_based: BUILTIN_ROLE_ACCOUNTS
                .iter()
                .map(|local| (local.to_string(), true))
                .collect(),
        }
    }

    pub fn with_disposable(mut self, domain: impl AsRef<str>) -> Self {
        self.disposable
            .insert(domain.as_ref().trim().to_ascii_lowercase(), true);
        self
    }

    pub fn with_role_account(mut self, local: impl AsRef<str>) -> Self {
        self.role_based
            .insert(local.as_ref().trim().to_ascii_lowercase(), true);
        self
    }

    pub fn is_disposable(&self, domain: &str) -> bool {
        lookup(&self.disposable, domain)
    }

    pub fn is_role_based(&self, local: &str) -> bool {
        lookup(&self.role_based, local)
    }
}

fn lookup(map: &HashMap<String, bool>, key: &str) -> bool {
    map.get(&key.to_ascii_lowercase()).copied().unwrap_or(false)
}

fn lowercase_keys(map: HashMap<String, bool>) -> HashMap<String, bool> {
    map.into_iter()
        .map(|(key, member)| (key.to_ascii_lowercase(), member))
        .collect()
}
