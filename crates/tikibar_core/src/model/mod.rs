//! Toolbar extension model: widgets, content factories and their forms.
//!
//! # Responsibility
//! - Define the objects integrators hand to the registration directives.
//! - Keep form derivation rules next to the content-type record they build.
//!
//! # Invariants
//! - Every widget and content factory carries an intrinsic name used as the
//!   default registration name.
//! - Form field names are unique within one form.

pub mod content_type;
pub mod widget;

use once_cell::sync::Lazy;
use regex::Regex;

static REGISTRATION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+$").expect("valid registration name regex"));

/// Returns whether `value` can be used as a widget or content-type name.
pub fn is_valid_registration_name(value: &str) -> bool {
    REGISTRATION_NAME_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::is_valid_registration_name;

    #[test]
    fn accepts_plain_and_dotted_names() {
        assert!(is_valid_registration_name("clock"));
        assert!(is_valid_registration_name("Page"));
        assert!(is_valid_registration_name("sql.queries"));
    }

    #[test]
    fn rejects_empty_and_whitespace_names() {
        assert!(!is_valid_registration_name(""));
        assert!(!is_valid_registration_name("request timer"));
        assert!(!is_valid_registration_name(" clock"));
    }
}
