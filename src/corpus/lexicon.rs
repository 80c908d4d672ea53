//! Word lists used as phrase boundaries
//!
//! All lookups take a lowercased word.

use std::collections::HashSet;
use std::sync::OnceLock;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "again", "against", "all", "almost", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "are", "around", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing",
    "done", "down", "due", "during", "each", "either", "especially", "etc", "even", "every",
    "few", "for", "from", "further", "furthermore", "had", "has", "have", "having", "he",
    "hence", "her", "here", "hers", "him", "his", "how", "however", "i", "if", "in",
    "including", "into", "is", "it", "its", "itself", "just", "least", "less", "many", "may",
    "might", "more", "moreover", "most", "much", "must", "namely", "neither", "no", "nor",
    "not", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "out", "over", "own", "particularly", "per", "rather", "same",
    "several", "shall", "she", "should", "since", "so", "some", "still", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "therefore", "these", "they",
    "this", "those", "through", "thus", "to", "too", "towards", "two", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "when", "where",
    "whereas", "whether", "which", "while", "who", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "three", "first", "second", "new",
    "today", "now", "recently", "currently", "widely", "commonly", "typically", "usually",
    "alongside", "early", "later", "beyond", "like", "unlike", "whilst", "besides",
];

/// Determiners stripped from the front of labels during normalization
pub const DETERMINERS: &[&str] = &["the", "a", "an", "this", "that", "these", "those"];

/// Verb stems common in academic prose that are rarely nouns.
const VERB_STEMS: &[&str] = &[
    "propose", "present", "show", "demonstrate", "introduce", "describe", "evaluate", "apply",
    "employ", "solve", "allow", "remain", "become", "appear", "seem", "contain", "consist",
    "depend", "rely", "perform", "obtain", "predict", "generate", "combine", "extend",
    "suggest", "indicate", "reveal", "explore", "examine", "investigate", "analyze", "analyse",
    "compare", "achieve", "affect", "protect", "prevent", "detect", "identify", "optimize",
    "enhance", "mitigate", "withstand", "resist", "improve", "reduce", "enable", "require",
    "provide", "outperform", "include", "involve", "ensure", "maintain", "facilitate",
    "establish", "determine", "consider", "discuss", "tend", "fail", "succeed", "emerge",
    "exhibit", "represent", "encode", "accelerate", "underlie", "integrate", "adopt", "observe",
    "argue", "exist", "occur", "dominate", "cover", "underpin", "teach",
];

/// Stems that read as nouns as often as verbs ("support vector machines",
/// "user study"). They end a phrase only in a verb context.
const NOUN_VERB_STEMS: &[&str] = &[
    "support", "study", "report", "term", "name", "call", "address", "outline", "exploit",
    "leverage", "design", "test", "model", "process", "control", "access",
];

/// Pronouns, auxiliaries and modals after which an ambiguous stem is read
/// as a verb
const VERB_SUBJECTS: &[&str] = &[
    "we", "they", "it", "to", "also", "which", "who", "that", "can", "may", "is", "are", "was",
    "were", "be", "been", "has", "have", "had",
];

const IRREGULAR_VERBS: &[&str] = &[
    "shown", "known", "given", "taken", "made", "found", "led", "built", "based", "gave",
    "took", "became", "seen", "drawn", "chosen", "grown", "shows", "uses", "used", "makes",
    "gives", "takes", "finds", "leads", "holds", "held", "lets", "taught",
];

/// Single words too generic to stand alone as a concept
const GENERIC_NOUNS: &[&str] = &[
    "paper", "papers", "approach", "approaches", "method", "methods", "result", "results",
    "work", "works", "study", "studies", "problem", "problems", "way", "ways", "use", "case",
    "cases", "part", "parts", "number", "set", "type", "types", "kind", "order", "terms",
    "section", "figure", "table", "example", "examples", "fact", "question", "questions",
    "technique", "techniques", "author", "authors", "article", "articles", "literature",
    "state", "art", "field", "area", "areas", "aspect", "aspects", "issue", "issues", "time",
    "times", "end", "lot", "thing", "things", "point", "points", "level", "levels", "form",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn verbs() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set: HashSet<String> = IRREGULAR_VERBS.iter().map(|v| v.to_string()).collect();
        for stem in VERB_STEMS {
            set.extend(inflect(stem));
        }
        set
    })
}

fn noun_verbs() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| NOUN_VERB_STEMS.iter().flat_map(|stem| inflect(stem)).collect())
}

fn generic_nouns() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| GENERIC_NOUNS.iter().copied().collect())
}

/// Base form, third person singular and past forms of a regular verb.
fn inflect(stem: &str) -> Vec<String> {
    let mut forms = vec![stem.to_string()];
    if let Some(base) = stem.strip_suffix('y') {
        if !base.ends_with(['a', 'e', 'i', 'o', 'u']) {
            forms.push(format!("{}ies", base));
            forms.push(format!("{}ied", base));
            return forms;
        }
    }
    if stem.ends_with(['s', 'x', 'z']) || stem.ends_with("sh") || stem.ends_with("ch") {
        forms.push(format!("{}es", stem));
    } else {
        forms.push(format!("{}s", stem));
    }
    if stem.ends_with('e') {
        forms.push(format!("{}d", stem));
    } else {
        forms.push(format!("{}ed", stem));
    }
    forms
}

pub fn is_stopword(word: &str) -> bool {
    stopwords().contains(word)
}

pub fn is_verb(word: &str) -> bool {
    verbs().contains(word)
}

/// Noun-verb ambiguous form such as "support" or "studies"
pub fn is_noun_verb(word: &str) -> bool {
    noun_verbs().contains(word)
}

pub fn is_verb_subject(word: &str) -> bool {
    VERB_SUBJECTS.contains(&word)
}

pub fn is_generic_noun(word: &str) -> bool {
    generic_nouns().contains(word)
}

pub fn is_determiner(word: &str) -> bool {
    DETERMINERS.contains(&word)
}

/// A word that cannot sit inside a concept phrase
pub fn is_phrase_boundary(word: &str) -> bool {
    is_stopword(word) || is_verb(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflections() {
        assert!(is_verb("resists"));
        assert!(is_verb("resisted"));
        assert!(is_verb("applies"));
        assert!(is_verb("applied"));
        assert!(is_verb("addresses"));
        assert!(is_verb("proposed"));
        assert!(is_verb("shown"));
        assert!(!is_verb("attacks"));
        assert!(!is_verb("cryptography"));
    }

    #[test]
    fn test_boundaries() {
        assert!(is_phrase_boundary("the"));
        assert!(is_phrase_boundary("such"));
        assert!(is_phrase_boundary("improves"));
        assert!(!is_phrase_boundary("lattice"));
        assert!(is_determiner("these"));
        assert!(is_generic_noun("approach"));
        assert!(is_phrase_boundary("alongside"));
    }

    #[test]
    fn test_noun_verb_stems_are_not_hard_boundaries() {
        for word in ["support", "supports", "study", "studies", "name", "reported"] {
            assert!(is_noun_verb(word), "{}", word);
            assert!(!is_phrase_boundary(word), "{}", word);
        }
        assert!(is_verb_subject("we"));
    }
}
