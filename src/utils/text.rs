/// Trims the text and collapses every run of whitespace into a single space.
pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
