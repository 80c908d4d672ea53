//! Noun-phrase chunking shared by the extractors
//!
//! A chunk is a maximal run of content words inside one sentence: stopwords,
//! verbs, punctuation and bare numbers all end it. A noun-verb ambiguous word
//! ("support", "study") ends it only when read as a verb.

use crate::corpus::lexicon;
use crate::corpus::{PreparedPaper, Sentence, Token};
use std::collections::HashMap;
use std::ops::Range;

/// Word that may appear inside a concept phrase
pub fn is_content_word(token: &Token) -> bool {
    token.is_word()
        && token.lower.chars().count() > 1
        && token.lower.chars().any(char::is_alphabetic)
        && !lexicon::is_phrase_boundary(&token.lower)
}

/// An ambiguous stem after a subject ("we study") or before a determiner
/// ("supports the")
fn acts_as_verb(tokens: &[Token], i: usize) -> bool {
    if !lexicon::is_noun_verb(&tokens[i].lower) {
        return false;
    }
    let after_subject = i
        .checked_sub(1)
        .is_some_and(|p| lexicon::is_verb_subject(&tokens[p].lower));
    let before_determiner = tokens
        .get(i + 1)
        .is_some_and(|n| lexicon::is_determiner(&n.lower));
    after_subject || before_determiner
}

/// Token index ranges of the chunks in a sentence
pub fn chunk_ranges(sentence: &Sentence) -> Vec<Range<usize>> {
    let tokens = &sentence.tokens;
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;
    for (i, token) in tokens.iter().enumerate() {
        let inside = is_content_word(token) && !acts_as_verb(tokens, i);
        match (inside, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                ranges.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push(s..tokens.len());
    }
    ranges
}

/// Clip a chunk to its head-final tail of at most `max_tokens` words
pub fn head_final(range: Range<usize>, max_tokens: usize) -> Range<usize> {
    let len = range.end - range.start;
    if len > max_tokens {
        range.end - max_tokens..range.end
    } else {
        range
    }
}

/// Space-joined display forms
pub fn phrase_surface(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.surface.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A lone generic noun ("approach", "results") is never a concept
pub fn is_viable(tokens: &[Token]) -> bool {
    match tokens {
        [] => false,
        [only] => !lexicon::is_generic_noun(&only.lower),
        _ => true,
    }
}

/// A distinct phrase seen in one paper
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    /// Lowercased, space-joined words
    pub key: String,
    /// First surface form seen
    pub surface: String,
    pub words: Vec<String>,
    pub count: usize,
}

/// Counts phrases in first-seen order
#[derive(Debug, Default)]
pub struct PhraseTally {
    index: HashMap<String, usize>,
    phrases: Vec<Phrase>,
}

impl PhraseTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tokens: &[Token]) {
        if !is_viable(tokens) {
            return;
        }
        let words: Vec<String> = tokens.iter().map(|t| t.lower.clone()).collect();
        let key = words.join(" ");
        match self.index.get(&key) {
            Some(&i) => self.phrases[i].count += 1,
            None => {
                self.index.insert(key.clone(), self.phrases.len());
                self.phrases.push(Phrase {
                    key,
                    surface: phrase_surface(tokens),
                    words,
                    count: 1,
                });
            }
        }
    }

    pub fn into_phrases(self) -> Vec<Phrase> {
        self.phrases
    }
}

/// Whole chunks (clipped head-final) of a paper
pub fn chunk_phrases(paper: &PreparedPaper, max_tokens: usize) -> Vec<Phrase> {
    let mut tally = PhraseTally::new();
    for sentence in &paper.sentences {
        for range in chunk_ranges(sentence) {
            tally.add(&sentence.tokens[head_final(range, max_tokens)]);
        }
    }
    tally.into_phrases()
}

/// Every head-final n-gram (1..=`max_tokens`) of every chunk of a paper.
///
/// "convolutional neural networks" yields "networks", "neural networks" and
/// the whole chunk, never the headless "convolutional neural".
pub fn ngram_phrases(paper: &PreparedPaper, max_tokens: usize) -> Vec<Phrase> {
    let mut tally = PhraseTally::new();
    for sentence in &paper.sentences {
        for range in chunk_ranges(sentence) {
            let chunk = &sentence.tokens[range];
            for n in 1..=max_tokens.min(chunk.len()) {
                tally.add(&chunk[chunk.len() - n..]);
            }
        }
    }
    tally.into_phrases()
}
