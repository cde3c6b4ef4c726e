//! Sentence and word tokenization for OCR text

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace (or the end of
/// the text), or at a blank line. Internal whitespace, including the line
/// breaks OCR leaves mid-sentence, is collapsed to single spaces.
pub fn sentences(text: &str) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in paragraphs(text) {
        let chars: Vec<char> = paragraph.chars().collect();
        let mut start = 0;

        for i in 0..chars.len() {
            let terminal = matches!(chars[i], '.' | '!' | '?');
            let boundary = chars.get(i + 1).map_or(true, |next| next.is_whitespace());
            if terminal && boundary {
                push_sentence(&mut result, &chars[start..=i]);
                start = i + 1;
            }
        }

        if start < chars.len() {
            push_sentence(&mut result, &chars[start..]);
        }
    }

    result
}

/// Blocks of text separated by one or more blank lines
fn paragraphs(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

fn push_sentence(out: &mut Vec<String>, chars: &[char]) {
    let raw: String = chars.iter().collect();
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        out.push(normalized);
    }
}

/// Lowercased alphanumeric word tokens, in order of appearance
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split_on_terminals() {
        let text = "First one. Second one! Third one? Trailing fragment";
        assert_eq!(
            sentences(text),
            vec!["First one.", "Second one!", "Third one?", "Trailing fragment"]
        );
    }

    #[test]
    fn test_sentences_keep_decimals_and_abbreviated_numbers() {
        let text = "Pi is 3.14 roughly. Version 2.0 shipped.";
        assert_eq!(sentences(text), vec!["Pi is 3.14 roughly.", "Version 2.0 shipped."]);
    }

    #[test]
    fn test_sentences_join_wrapped_lines() {
        let text = "This sentence was\nwrapped by the scanner.\n\nHeading without period\nNext paragraph.";
        assert_eq!(
            sentences(text),
            vec![
                "This sentence was wrapped by the scanner.",
                "Heading without period Next paragraph.",
            ]
        );
    }

    #[test]
    fn test_sentences_empty() {
        assert!(sentences("").is_empty());
        assert!(sentences("   \n\n  ").is_empty());
    }

    #[test]
    fn test_words() {
        assert_eq!(words("Total: 42 dollars!"), vec!["total", "42", "dollars"]);
        assert!(words("  ...  ").is_empty());
    }
}
