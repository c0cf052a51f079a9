use std::borrow::Cow;

use regex::Regex;

/// Returns a lowercase representation, reusing the original string if already lowercase.
pub fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Lowercases and trims, the key form used by categorical lookups.
pub fn fold(input: &str) -> String {
    lowercase(input.trim()).into_owned()
}

/// True when trimming would change the value.
pub fn has_outer_whitespace(input: &str) -> bool {
    input.trim().len() != input.len()
}

/// Applies a regex replacement while avoiding allocation when there are no matches.
pub fn regex_replace<'a>(value: &'a str, regex: &Regex, replacement: &str) -> Cow<'a, str> {
    if regex.is_match(value) {
        Cow::Owned(regex.replace_all(value, replacement).into_owned())
    } else {
        Cow::Borrowed(value)
    }
}
