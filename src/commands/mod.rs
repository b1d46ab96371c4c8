pub mod find;
pub mod index;
pub mod inspect;
pub mod list;

/// Package patterns default to the package in the current directory
fn default_patterns(patterns: Vec<String>) -> Vec<String> {
    if patterns.is_empty() {
        vec![".".to_string()]
    } else {
        patterns
    }
}
