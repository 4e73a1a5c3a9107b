/// Lowercase, blank out punctuation, split on whitespace, drop 1-char tokens.
///
/// Index construction and querying must both go through this function.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_word_char(c) || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(tokenize("Revenue increased 15% to $2.3 billion."), vec!["revenue", "increased", "15", "to", "billion"]);
    }

    #[test]
    fn drops_single_characters() {
        assert_eq!(tokenize("a I x R&D"), Vec::<String>::new());
        assert_eq!(tokenize("Item 1A"), vec!["item", "1a"]);
    }

    #[test]
    fn keeps_underscores_and_unicode_words() {
        assert_eq!(tokenize("net_income Über-growth"), vec!["net_income", "über", "growth"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("  ...  ").is_empty());
    }
}
