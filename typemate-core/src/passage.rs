/// Split a generated passage into the words of a round.
/// Any run of whitespace separates words; empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
