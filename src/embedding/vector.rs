//! Immutable embedding vectors with cosine similarity

use crate::error::{ConceptError, ConceptResult};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A fixed-length, non-zero, finite embedding.
///
/// Components live behind an `Arc` so clones are cheap; the vector is never
/// mutated after construction. The magnitude is computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    values: Arc<[f32]>,
    magnitude: f64,
}

impl EmbeddingVector {
    /// Create a vector, rejecting empty, zero-magnitude or non-finite input.
    pub fn new(values: Vec<f32>) -> ConceptResult<Self> {
        if values.is_empty() {
            return Err(ConceptError::InvalidVector(
                "vector has no components".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ConceptError::InvalidVector(format!(
                "component {} is not finite",
                pos
            )));
        }

        let magnitude = values
            .iter()
            .map(|v| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt();
        if magnitude == 0.0 || !magnitude.is_finite() {
            return Err(ConceptError::InvalidVector(
                "vector has zero magnitude".to_string(),
            ));
        }

        Ok(Self {
            values: values.into(),
            magnitude,
        })
    }

    /// Dimensionality `d`
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean norm, always > 0
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Cosine similarity in [-1, 1].
    ///
    /// Symmetric: components are summed in index order regardless of receiver.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> ConceptResult<f64> {
        if self.dimension() != other.dimension() {
            return Err(ConceptError::DimensionMismatch {
                expected: self.dimension(),
                found: other.dimension(),
            });
        }
        let dot: f64 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| f64::from(*a) * f64::from(*b))
            .sum();
        Ok((dot / (self.magnitude * other.magnitude)).clamp(-1.0, 1.0))
    }

    /// Cosine distance `1 - cos`, in [0, 2]
    pub fn cosine_distance(&self, other: &EmbeddingVector) -> ConceptResult<f64> {
        Ok(1.0 - self.cosine_similarity(other)?)
    }

    /// Component-wise mean of a non-empty set of vectors sharing `d`.
    pub fn centroid<'a, I>(vectors: I) -> ConceptResult<Self>
    where
        I: IntoIterator<Item = &'a EmbeddingVector>,
    {
        let mut sum: Vec<f64> = Vec::new();
        let mut count = 0usize;
        for v in vectors {
            if count == 0 {
                sum = vec![0.0; v.dimension()];
            } else if v.dimension() != sum.len() {
                return Err(ConceptError::DimensionMismatch {
                    expected: sum.len(),
                    found: v.dimension(),
                });
            }
            for (acc, x) in sum.iter_mut().zip(v.values.iter()) {
                *acc += f64::from(*x);
            }
            count += 1;
        }
        if count == 0 {
            return Err(ConceptError::InvalidVector(
                "centroid of an empty set".to_string(),
            ));
        }
        Self::new(sum.into_iter().map(|x| (x / count as f64) as f32).collect())
    }
}

impl Serialize for EmbeddingVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_rejects_zero_and_non_finite() {
        assert!(matches!(
            EmbeddingVector::new(vec![0.0, 0.0]),
            Err(ConceptError::InvalidVector(_))
        ));
        assert!(matches!(
            EmbeddingVector::new(vec![1.0, f32::NAN]),
            Err(ConceptError::InvalidVector(_))
        ));
        assert!(matches!(
            EmbeddingVector::new(vec![f32::INFINITY]),
            Err(ConceptError::InvalidVector(_))
        ));
        assert!(EmbeddingVector::new(Vec::new()).is_err());
    }

    #[test]
    fn test_magnitude() {
        assert!((v(&[3.0, 4.0]).magnitude() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_known_values() {
        let a = v(&[1.0, 0.0, 0.0]);
        assert!((a.cosine_similarity(&v(&[2.0, 0.0, 0.0])).unwrap() - 1.0).abs() < 1e-9);
        assert!(a.cosine_similarity(&v(&[0.0, 1.0, 0.0])).unwrap().abs() < 1e-9);
        assert!((a.cosine_similarity(&v(&[-1.0, 0.0, 0.0])).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = v(&[0.3, -1.7, 2.2, 0.01]);
        let b = v(&[5.0, 0.2, -0.4, 9.0]);
        assert_eq!(
            a.cosine_similarity(&b).unwrap(),
            b.cosine_similarity(&a).unwrap()
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = v(&[1.0, 0.0]).cosine_similarity(&v(&[1.0, 0.0, 0.0]));
        assert!(matches!(
            err,
            Err(ConceptError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_centroid() {
        let c = EmbeddingVector::centroid([&v(&[1.0, 0.0]), &v(&[0.0, 1.0])]).unwrap();
        assert_eq!(c.as_slice(), &[0.5, 0.5]);
        assert!(EmbeddingVector::centroid(std::iter::empty()).is_err());
    }
}
