use scraper::{ElementRef, Selector};

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Text of the node with runs of whitespace (including non-breaking spaces)
/// collapsed to single spaces.
pub fn extract_clean_text(node: ElementRef) -> String {
    normalise_whitespace(&extract_text(node))
}

pub fn normalise_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleaned text of the first descendant matching `selector`, if it has any.
pub fn first_text(node: ElementRef, selector: &Selector) -> Option<String> {
    node.select(selector)
        .next()
        .map(extract_clean_text)
        .filter(|text| !text.is_empty())
}
