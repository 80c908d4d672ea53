//! Randomized invariant checks with seeded generators

mod common;

use common::{lattice_corpus, paper, pipeline};
use conceptmap::{ConceptError, EmbeddingVector, PipelineConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vector(rng: &mut StdRng, dimension: usize) -> EmbeddingVector {
    loop {
        let values: Vec<f32> = (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        if let Ok(v) = EmbeddingVector::new(values) {
            return v;
        }
    }
}

#[test]
fn test_cosine_symmetric_and_bounded() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let d = rng.gen_range(1..32);
        let a = random_vector(&mut rng, d);
        let b = random_vector(&mut rng, d);
        let ab = a.cosine_similarity(&b).unwrap();
        let ba = b.cosine_similarity(&a).unwrap();
        assert_eq!(ab, ba);
        assert!((-1.0..=1.0).contains(&ab), "cosine {} out of range", ab);
        assert!(a.magnitude() > 0.0);
    }
}

#[test]
fn test_mismatched_dimensions_fail() {
    let mut rng = StdRng::seed_from_u64(12);
    let a = random_vector(&mut rng, 4);
    let b = random_vector(&mut rng, 5);
    assert!(matches!(
        a.cosine_similarity(&b),
        Err(ConceptError::DimensionMismatch { expected: 4, found: 5 })
    ));
}

#[test]
fn test_invalid_vectors_rejected() {
    assert!(matches!(
        EmbeddingVector::new(vec![0.0, 0.0]),
        Err(ConceptError::InvalidVector(_))
    ));
    assert!(matches!(
        EmbeddingVector::new(vec![1.0, f32::NAN]),
        Err(ConceptError::InvalidVector(_))
    ));
}

const TOPICS: &[&str] = &[
    "Lattice-based cryptography resists quantum attacks.",
    "Neural networks, such as transformers and convolutional networks, dominate vision.",
    "Graph databases store property graphs on disk.",
    "Protein folding predictions rely on multiple sequence alignments.",
    "Federated learning protects client data during model training.",
    "Differential privacy bounds the leakage of statistical queries.",
    "Hash-based signatures offer conservative security assumptions.",
    "Reinforcement learning agents explore sparse reward environments.",
];

#[tokio::test]
async fn test_random_corpora_satisfy_hierarchy_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..6 {
        let papers: Vec<_> = (0..rng.gen_range(2..5))
            .map(|i| {
                let body: Vec<&str> = (0..3).map(|_| TOPICS[rng.gen_range(0..TOPICS.len())]).collect();
                paper(&format!("r{}-{}", round, i), &body.join(" "))
            })
            .collect();
        let max_levels = rng.gen_range(1..5);
        let config = PipelineConfig {
            max_hierarchy_levels: max_levels,
            ..PipelineConfig::default()
        };

        let hierarchy = pipeline(config).run(&papers).await.unwrap();
        assert!(hierarchy.validate().is_empty());

        // Every node is walked exactly once
        let walked = hierarchy.walk();
        assert_eq!(walked.len(), hierarchy.len());

        for node in walked {
            assert!(!node.evidence().is_empty());
            assert!((0.0..=1.0).contains(&node.confidence()));
            assert!(node.level() < max_levels);
            assert!(hierarchy.ancestors(node.id()).len() < max_levels);
            for (evidence, confidence) in hierarchy.evidence_for(node.id()) {
                assert!((0.0..=100.0).contains(&evidence.confidence()));
                assert!((0.0..=1.0).contains(&confidence));
            }
            if let Some(parent) = node.parent() {
                assert_eq!(hierarchy.node(parent).unwrap().level() + 1, node.level());
                assert_ne!(parent, node.id());
            }
        }

        let counts = &hierarchy.metadata().level_counts;
        assert_eq!(counts.iter().sum::<usize>(), hierarchy.len());
    }
}

#[tokio::test]
async fn test_concept_labels_occur_in_source_text() {
    let papers = lattice_corpus();
    let hierarchy = pipeline(PipelineConfig::default()).run(&papers).await.unwrap();
    for node in hierarchy.walk() {
        for (evidence, _) in hierarchy.evidence_for(node.id()) {
            let source = papers
                .iter()
                .find(|p| &p.id == evidence.paper_id())
                .unwrap()
                .document_text();
            assert!(source.contains(evidence.text()));
        }
    }
}
