//! Synthetic paper corpora

use conceptmap::Paper;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub const LATTICE_SENTENCE: &str = "Lattice-based cryptography resists quantum attacks.";

/// Background sentences long enough to make any paper eligible
const FILLER: &str = "Our evaluation covers several parameter sets and provides key sizes \
    in detail. The results show practical performance on commodity hardware. \
    We release every benchmark script alongside the measurements.";

/// A paper whose abstract is `body` followed by filler text
pub fn paper(id: &str, body: &str) -> Paper {
    Paper::new(id, format!("Paper {}", id))
        .with_authors(vec!["A. Author".to_string()])
        .with_abstract(format!("{} {}", body, FILLER))
}

/// Three papers, each containing the lattice sentence verbatim
pub fn lattice_corpus() -> Vec<Paper> {
    vec![
        paper("p1", &format!("{} We implement module lattices for key exchange.", LATTICE_SENTENCE)),
        paper("p2", &format!("We analyse structured signature schemes. {}", LATTICE_SENTENCE)),
        paper("p3", &format!("{} We compare hash-based signatures.", LATTICE_SENTENCE)),
    ]
}

/// One paper asserting "neural networks, such as transformers and
/// convolutional networks"
pub fn hyponymy_corpus() -> Vec<Paper> {
    vec![paper(
        "nn",
        "Neural networks, such as transformers and convolutional networks, dominate \
         modern vision research. Transformers scale well with data. Convolutional \
         networks remain strong on small images.",
    )]
}

/// `n` papers built from invented words; no word is shared between papers.
pub fn disjoint_corpus(n: usize, seed: u64) -> Vec<Paper> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut used: HashSet<String> = HashSet::new();
    let mut word = |rng: &mut StdRng| loop {
        let len = rng.gen_range(6..10);
        let w: String = (0..len)
            .map(|i| {
                let set: &[u8] = if i % 2 == 0 { b"bdfgklmnprstvz" } else { b"aeiou" };
                set[rng.gen_range(0..set.len())] as char
            })
            .collect();
        if used.insert(w.clone()) {
            return w;
        }
    };

    (0..n)
        .map(|p| {
            let sentences: Vec<String> = (0..6)
                .map(|_| {
                    let words: Vec<String> = (0..rng.gen_range(5..8)).map(|_| word(&mut rng)).collect();
                    let mut sentence = words.join(" ");
                    if let Some(first) = sentence.get_mut(0..1) {
                        first.make_ascii_uppercase();
                    }
                    sentence + "."
                })
                .collect();
            Paper::new(format!("d{}", p), format!("Disjoint {}", p)).with_abstract(sentences.join(" "))
        })
        .collect()
}
