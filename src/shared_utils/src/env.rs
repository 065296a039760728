/// Reads an optional override from the environment.
///
/// Unset, empty, whitespace-only and non-UTF-8 values all count as "no override", so a
/// blank `export FOO=` in a shell profile never replaces a value from a config file.
pub fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
