//! `${VAR}` template expansion
//!
//! Used for step arguments, environment overlays, and caveat messages.
//! Unknown variables are left in place so a typo is visible in the output
//! instead of silently vanishing.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid variable pattern")
    })
}

/// Replace every `${VAR}` in `input` with its value from `vars`.
///
/// Variables without a value are left untouched (and logged), never
/// replaced with an empty string.
pub fn expand_vars(input: &str, vars: &BTreeMap<String, String>) -> String {
    var_pattern()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(variable = name, "Undefined variable in template");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
