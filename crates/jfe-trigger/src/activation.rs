//! Which pages the controller switches on for.

use crate::page::PageLocation;
use serde::Deserialize;

const DEFAULT_PATHS: &[&str] = &[
    "/",
    "/level/*",
    "/radicals*",
    "/kanji*",
    "/vocabulary*",
    "/review/session",
    "/lesson/session",
];

/// Host and path patterns a page must match. The host matches itself and
/// any subdomain; paths are globs where `*` spans any run of characters,
/// `/` included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActivationRules {
    pub domain: String,
    pub paths: Vec<String>,
}

impl Default for ActivationRules {
    fn default() -> Self {
        Self {
            domain: "wanikani.com".to_owned(),
            paths: DEFAULT_PATHS.iter().map(|path| (*path).to_owned()).collect(),
        }
    }
}

impl ActivationRules {
    pub fn matches(&self, location: &PageLocation) -> bool {
        self.matches_host(location.host())
            && self
                .paths
                .iter()
                .any(|pattern| glob_matches(pattern, location.path()))
    }

    fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host.eq_ignore_ascii_case(domain)
            || host
                .len()
                .checked_sub(domain.len() + 1)
                .and_then(|dot| host.get(dot..))
                .and_then(|tail| tail.strip_prefix('.'))
                .is_some_and(|tail| tail.eq_ignore_ascii_case(domain))
    }
}

/// Matches `text` against a pattern where `*` stands for any (possibly
/// empty) sequence. Backtracks only to the most recent star.
fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0_usize, 0_usize);
    let mut last_star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            last_star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = last_star {
            p = star + 1;
            t = matched + 1;
            last_star = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|byte| *byte == b'*')
}
