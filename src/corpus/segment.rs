//! Sentence segmentation and tokenization
//!
//! Every offset here is a character offset, never a byte offset, so evidence
//! positions stay meaningful for non-ASCII text.

/// Abbreviations after which a period never ends a sentence (lowercased,
/// trailing period included)
const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "al.", "fig.", "figs.", "eq.", "eqs.", "vs.", "cf.", "dr.", "mr.", "mrs.",
    "ms.", "prof.", "no.", "nos.", "sec.", "ref.", "refs.", "approx.", "resp.", "vol.", "pp.",
    "ch.", "jr.", "inc.", "ltd.", "corp.", "viz.", "ca.", "tab.", "def.", "thm.", "lem.",
];

/// Sentences shorter than this (after trimming) are dropped
pub const MIN_SENTENCE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
}

/// A token with character offsets relative to its sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Text as written
    pub text: String,
    /// Display form: sentence-initial capitalized words are case-folded
    pub surface: String,
    pub lower: String,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl Token {
    fn word(text: String, start: usize, end: usize, sentence_initial: bool) -> Self {
        let lower = text.to_lowercase();
        let surface = if sentence_initial && is_capitalized(&text) {
            lower.clone()
        } else {
            text.clone()
        };
        Self {
            text,
            surface,
            lower,
            start,
            end,
            kind: TokenKind::Word,
        }
    }

    fn punct(c: char, start: usize) -> Self {
        let text = c.to_string();
        Self {
            surface: text.clone(),
            lower: text.clone(),
            text,
            start,
            end: start + 1,
            kind: TokenKind::Punct,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Uppercase first letter with no other uppercase letters ("Lattice-based"
/// but not "LWE" or "McEliece")
fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => !chars.any(char::is_uppercase),
        _ => false,
    }
}

/// A trimmed sentence located in its document
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub text: String,
    /// Character offset of the first character in the document text
    pub offset: usize,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(text: String, offset: usize) -> Self {
        let tokens = tokenize(&text);
        Self {
            text,
            offset,
            tokens,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_word())
    }
}

/// Split text into word and punctuation tokens.
///
/// Words are alphanumeric runs that may contain internal hyphens and
/// apostrophes ("lattice-based", "Shor's"); every other non-space character
/// is a single punctuation token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut seen_word = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if !c.is_alphanumeric() {
            tokens.push(Token::punct(c, i));
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        while i < chars.len() {
            let d = chars[i];
            if d.is_alphanumeric() {
                i += 1;
            } else if matches!(d, '-' | '\'' | '’')
                && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric())
            {
                i += 2;
            } else {
                break;
            }
        }
        let word: String = chars[start..i].iter().collect();
        tokens.push(Token::word(word, start, i, !seen_word));
        seen_word = true;
    }

    tokens
}

/// Segment document text into sentences with character offsets.
///
/// Breaks at `.`, `!` or `?` (plus closing quotes or brackets) followed by
/// whitespace and an uppercase letter, digit or opening quote, and at blank
/// lines. Known abbreviations, initials and decimals never break.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' && is_paragraph_break(&chars, i) {
            push_sentence(&chars, start, i, &mut sentences);
            start = i + 1;
        } else if matches!(c, '.' | '!' | '?') {
            let mut end = i + 1;
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | ']' | '”' | '’') {
                end += 1;
            }
            if ends_sentence(&chars, i, end) {
                push_sentence(&chars, start, end, &mut sentences);
                start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    push_sentence(&chars, start, chars.len(), &mut sentences);

    sentences
}

/// Recover offsets for sentences segmented upstream.
///
/// Each sentence must appear in `text` after the previous one; returns `None`
/// as soon as one cannot be found so the caller can segment instead.
pub fn locate_sentences(text: &str, provided: &[String]) -> Option<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut cursor_byte = 0;
    let mut cursor_char = 0;

    for raw in provided {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_SENTENCE_CHARS {
            continue;
        }
        let found = text[cursor_byte..].find(trimmed)?;
        let byte_pos = cursor_byte + found;
        let char_pos = cursor_char + text[cursor_byte..byte_pos].chars().count();

        sentences.push(Sentence::new(trimmed.to_string(), char_pos));
        cursor_byte = byte_pos + trimmed.len();
        cursor_char = char_pos + trimmed.chars().count();
    }

    Some(sentences)
}

fn is_paragraph_break(chars: &[char], newline: usize) -> bool {
    chars[newline + 1..]
        .iter()
        .take_while(|c| c.is_whitespace())
        .any(|c| *c == '\n')
}

fn ends_sentence(chars: &[char], mark: usize, end: usize) -> bool {
    if end >= chars.len() {
        return true;
    }
    if !chars[end].is_whitespace() {
        // "3.14", "e.g.x", URLs
        return false;
    }
    let next = match chars[end..].iter().find(|c| !c.is_whitespace()) {
        Some(c) => *c,
        None => return true,
    };
    if !(next.is_uppercase() || next.is_ascii_digit() || matches!(next, '"' | '“' | '(' | '[' | '\''))
    {
        return false;
    }
    if chars[mark] != '.' {
        return true;
    }

    let word_start = chars[..mark]
        .iter()
        .rposition(|c| c.is_whitespace() || matches!(*c, '(' | '[' | '"' | '“'))
        .map_or(0, |p| p + 1);
    let word: String = chars[word_start..=mark].iter().collect::<String>().to_lowercase();
    if ABBREVIATIONS.contains(&word.as_str()) {
        return false;
    }

    // Author initials: "J. Smith"
    let stem = &chars[word_start..mark];
    !(stem.len() == 1 && stem[0].is_uppercase())
}

fn push_sentence(chars: &[char], start: usize, end: usize, out: &mut Vec<Sentence>) {
    let span = &chars[start..end];
    let Some(first) = span.iter().position(|c| !c.is_whitespace()) else {
        return;
    };
    let last = span.iter().rposition(|c| !c.is_whitespace()).unwrap_or(first);
    let text: String = span[first..=last].iter().collect();
    if text.chars().count() < MIN_SENTENCE_CHARS {
        return;
    }
    out.push(Sentence::new(text, start + first));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let s = split_sentences("Lattices are hard. Codes are too! Are hashes fast? Yes they are.");
        assert_eq!(
            texts(&s),
            vec![
                "Lattices are hard.",
                "Codes are too!",
                "Are hashes fast?",
                "Yes they are."
            ]
        );
    }

    #[test]
    fn test_abbreviations_and_decimals_do_not_split() {
        let s = split_sentences(
            "Schemes, e.g. Kyber, are fast. See Fig. 3 for details. Accuracy was 3.5 percent. Smith et al. Showed this.",
        );
        assert_eq!(
            texts(&s),
            vec![
                "Schemes, e.g. Kyber, are fast.",
                "See Fig. 3 for details.",
                "Accuracy was 3.5 percent.",
                "Smith et al. Showed this."
            ]
        );
    }

    #[test]
    fn test_initials_do_not_split() {
        let s = split_sentences("The work of J. Smith is cited widely.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_lowercase_continuation_does_not_split() {
        let s = split_sentences("The value is approx. ten units in total here.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_offsets_are_char_offsets() {
        let text = "Über alles gilt hier. Zweiter Satz ist länger.";
        let s = split_sentences(text);
        assert_eq!(s.len(), 2);
        let second: String = text.chars().skip(s[1].offset).take(s[1].text.chars().count()).collect();
        assert_eq!(second, s[1].text);
    }

    #[test]
    fn test_blank_line_breaks_and_short_sentences_dropped() {
        let s = split_sentences("Introduction\n\nQuantum computers threaten RSA. Ok.");
        assert_eq!(texts(&s), vec!["Introduction", "Quantum computers threaten RSA."]);
    }

    #[test]
    fn test_tokenize_keeps_internal_hyphens() {
        let tokens = tokenize("Lattice-based cryptography (LWE) isn't broken.");
        let words: Vec<&str> = tokens.iter().filter(|t| t.is_word()).map(|t| t.surface.as_str()).collect();
        assert_eq!(words, vec!["lattice-based", "cryptography", "LWE", "isn't", "broken"]);
        assert_eq!(tokens[0].text, "Lattice-based");
        assert_eq!((tokens[0].start, tokens[0].end), (0, 13));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Punct && t.text == "("));
    }

    #[test]
    fn test_mid_sentence_capitals_preserved() {
        let tokens = tokenize("We study Kyber and Dilithium.");
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["we", "study", "Kyber", "and", "Dilithium", "."]);
    }

    #[test]
    fn test_locate_provided_sentences() {
        let text = "First sentence here. Second sentence here.";
        let located = locate_sentences(
            text,
            &["First sentence here.".into(), " Second sentence here. ".into()],
        )
        .unwrap();
        assert_eq!(located[1].offset, 21);

        assert!(locate_sentences(text, &["Not in the text at all.".into()]).is_none());
    }
}
