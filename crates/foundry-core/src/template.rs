//! `{{ name }}` placeholder substitution for library markdown.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    /// Placeholder names with no value, sorted and deduplicated. They are
    /// left verbatim in `text`.
    pub unresolved: Vec<String>,
}

pub fn render(template: &str, vars: &BTreeMap<&str, String>) -> Rendered {
    let mut unresolved = BTreeSet::new();
    let text = placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.clone(),
                None => {
                    unresolved.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned();
    Rendered {
        text,
        unresolved: unresolved.into_iter().collect(),
    }
}
