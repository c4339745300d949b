/// Derive the API-facing field key of a property from its title.
///
/// Leading and trailing whitespace is dropped, every inner whitespace run becomes a
/// single `_`, and the result is lowercased. Nothing else is normalized, so
/// punctuation and non-ASCII letters pass through.
pub fn derive_name(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}
