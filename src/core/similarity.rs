use std::collections::{HashMap, HashSet};
use crate::core::geometry::{centered, cosine_similarity, distance_profile, euclidean_distance};
use crate::error::DataError;
use crate::models::{Candidate, CandidateList, Participant, SimilarityStrategy};

/// Symmetric pairwise similarity over a fixed participant set
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    scores: Vec<f64>,
    normalize_rows: bool,
}

impl SimilarityMatrix {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Raw score between two distinct participants; `None` for self or unknown ids
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        if i == j {
            return None;
        }
        Some(self.scores[i * self.ids.len() + j])
    }

    /// Ranked candidate list for every participant, in input order.
    ///
    /// Ties are broken by id so the order is deterministic. The geometric
    /// strategy min-max normalizes each row to [0, 1] first. A row without
    /// spread keeps a range of 1, so every candidate in it scores 0.0.
    pub fn candidate_lists(&self) -> Vec<CandidateList> {
        let n = self.ids.len();
        (0..n)
            .map(|i| {
                let row = &self.scores[i * n..(i + 1) * n];
                let mut candidates: Vec<Candidate> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| Candidate {
                        id: self.ids[j].clone(),
                        score: row[j],
                    })
                    .collect();

                if self.normalize_rows {
                    normalize(&mut candidates);
                }

                candidates.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.id.cmp(&b.id))
                });

                CandidateList::new(self.ids[i].clone(), candidates)
            })
            .collect()
    }
}

fn normalize(candidates: &mut [Candidate]) {
    let (min, max) = candidates
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c.score), hi.max(c.score))
        });
    let range = if max > min { max - min } else { 1.0 };
    for c in candidates.iter_mut() {
        c.score = (c.score - min) / range;
    }
}

/// Converts answer vectors into pairwise similarity under a named strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityModel {
    strategy: SimilarityStrategy,
}

impl SimilarityModel {
    pub fn new(strategy: SimilarityStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SimilarityStrategy {
        self.strategy
    }

    /// Compute the similarity of every participant against every other
    ///
    /// # Errors
    /// `DataError` for an empty set, blank or duplicate ids, empty or
    /// non-finite answer vectors, mismatched vector lengths, or too few
    /// answers to form a point under the geometric strategy.
    pub fn compute(&self, participants: &[Participant]) -> Result<SimilarityMatrix, DataError> {
        let width = validate_answers(participants)?;

        let vectors: Vec<Vec<f64>> = match self.strategy {
            SimilarityStrategy::Geometric { pairing } => {
                if width < 2 {
                    return Err(DataError::TooFewAnswers {
                        needed: 2,
                        found: width,
                    });
                }
                participants
                    .iter()
                    .map(|p| distance_profile(&p.answers, pairing))
                    .collect()
            }
            SimilarityStrategy::Cosine { centered: true } => {
                participants.iter().map(|p| centered(&p.answers)).collect()
            }
            SimilarityStrategy::Cosine { centered: false } => {
                participants.iter().map(|p| p.answers.clone()).collect()
            }
        };

        let n = participants.len();
        let mut scores = vec![f64::NAN; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let score = self.pair_score(&vectors[i], &vectors[j]);
                scores[i * n + j] = score;
                scores[j * n + i] = score;
            }
        }

        tracing::debug!(
            "Similarity computed for {} participants ({})",
            n,
            self.strategy
        );

        Ok(SimilarityMatrix {
            ids: participants.iter().map(|p| p.id.clone()).collect(),
            index: participants
                .iter()
                .enumerate()
                .map(|(i, p)| (p.id.clone(), i))
                .collect(),
            scores,
            normalize_rows: matches!(self.strategy, SimilarityStrategy::Geometric { .. }),
        })
    }

    #[inline]
    fn pair_score(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.strategy {
            SimilarityStrategy::Geometric { .. } => (-euclidean_distance(a, b)).exp(),
            SimilarityStrategy::Cosine { .. } => cosine_similarity(a, b),
        }
    }
}

/// Check ids and answer vectors; returns the shared vector length
fn validate_answers(participants: &[Participant]) -> Result<usize, DataError> {
    let first = participants.first().ok_or(DataError::EmptyParticipantSet)?;
    let width = first.answers.len();

    let mut seen = HashSet::with_capacity(participants.len());
    for (position, p) in participants.iter().enumerate() {
        if p.id.trim().is_empty() {
            return Err(DataError::BlankId(position));
        }
        if !seen.insert(p.id.as_str()) {
            return Err(DataError::DuplicateId(p.id.clone()));
        }
        if p.answers.is_empty() {
            return Err(DataError::EmptyAnswers(p.id.clone()));
        }
        if p.answers.len() != width {
            return Err(DataError::LengthMismatch {
                id: p.id.clone(),
                expected: width,
                found: p.answers.len(),
            });
        }
        if let Some(index) = p.answers.iter().position(|v| !v.is_finite()) {
            return Err(DataError::NonFiniteAnswer {
                id: p.id.clone(),
                index,
            });
        }
    }

    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointPairing;

    fn participant(id: &str, answers: &[f64]) -> Participant {
        Participant::new(id, answers.to_vec())
    }

    fn sample() -> Vec<Participant> {
        vec![
            participant("a", &[1.0, 2.0, 3.0, 4.0]),
            participant("b", &[1.0, 2.0, 3.0, 5.0]),
            participant("c", &[5.0, 1.0, 5.0, 1.0]),
            participant("d", &[2.0, 2.0, 4.0, 4.0]),
        ]
    }

    fn all_strategies() -> Vec<SimilarityStrategy> {
        vec![
            SimilarityStrategy::Geometric {
                pairing: PointPairing::AllPairs,
            },
            SimilarityStrategy::Geometric {
                pairing: PointPairing::Consecutive,
            },
            SimilarityStrategy::Cosine { centered: false },
            SimilarityStrategy::Cosine { centered: true },
        ]
    }

    #[test]
    fn test_scores_are_symmetric() {
        let people = sample();
        for strategy in all_strategies() {
            let matrix = SimilarityModel::new(strategy).compute(&people).unwrap();
            for a in &people {
                for b in &people {
                    if a.id == b.id {
                        assert_eq!(matrix.score(&a.id, &b.id), None);
                    } else {
                        assert_eq!(matrix.score(&a.id, &b.id), matrix.score(&b.id, &a.id));
                    }
                }
            }
        }
    }

    #[test]
    fn test_identical_answers_score_highest() {
        let people = vec![
            participant("a", &[1.0, 5.0, 2.0]),
            participant("b", &[1.0, 5.0, 2.0]),
            participant("c", &[4.0, 1.0, 1.0]),
        ];
        let matrix = SimilarityModel::default().compute(&people).unwrap();
        assert!((matrix.score("a", "b").unwrap() - 1.0).abs() < 1e-12);

        let lists = matrix.candidate_lists();
        assert_eq!(lists[0].candidates[0].id, "b");
        assert_eq!(lists[0].candidates[0].score, 1.0);
        assert_eq!(lists[0].candidates[1].score, 0.0);
    }

    #[test]
    fn test_row_without_spread_scores_zero() {
        let people = vec![participant("a", &[1.0, 2.0, 3.0]), participant("b", &[3.0, 1.0, 2.0])];
        let matrix = SimilarityModel::default().compute(&people).unwrap();

        for list in matrix.candidate_lists() {
            assert_eq!(list.len(), 1);
            assert_eq!(list.candidates[0].score, 0.0);
        }
    }

    #[test]
    fn test_candidate_lists_exclude_self_and_are_sorted() {
        let matrix = SimilarityModel::default().compute(&sample()).unwrap();
        for list in matrix.candidate_lists() {
            assert_eq!(list.len(), 3);
            assert!(!list.contains(&list.owner));
            for w in list.candidates.windows(2) {
                assert!(w[0].score >= w[1].score);
            }
            assert!(list.candidates.iter().all(|c| (0.0..=1.0).contains(&c.score)));
        }
    }

    #[test]
    fn test_ties_broken_by_id() {
        let people = vec![
            participant("z", &[1.0, 1.0]),
            participant("y", &[1.0, 1.0]),
            participant("x", &[1.0, 1.0]),
        ];
        let matrix = SimilarityModel::new(SimilarityStrategy::Cosine { centered: false })
            .compute(&people)
            .unwrap();
        let lists = matrix.candidate_lists();
        assert_eq!(lists[0].ids().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_centered_cosine_constant_responder_scores_zero() {
        let people = vec![
            participant("flat", &[3.0, 3.0, 3.0]),
            participant("b", &[1.0, 3.0, 5.0]),
            participant("c", &[5.0, 3.0, 1.0]),
        ];
        let matrix = SimilarityModel::new(SimilarityStrategy::Cosine { centered: true })
            .compute(&people)
            .unwrap();
        assert_eq!(matrix.score("flat", "b"), Some(0.0));
        assert_eq!(matrix.score("flat", "c"), Some(0.0));
        assert!((matrix.score("b", "c").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_data_errors() {
        let model = SimilarityModel::default();

        assert_eq!(model.compute(&[]).unwrap_err(), DataError::EmptyParticipantSet);

        let empty = vec![participant("a", &[])];
        assert_eq!(model.compute(&empty).unwrap_err(), DataError::EmptyAnswers("a".to_string()));

        let mismatch = vec![participant("a", &[1.0, 2.0]), participant("b", &[1.0])];
        assert!(matches!(
            model.compute(&mismatch).unwrap_err(),
            DataError::LengthMismatch { expected: 2, found: 1, .. }
        ));

        let nan = vec![participant("a", &[1.0, f64::NAN])];
        assert!(matches!(
            model.compute(&nan).unwrap_err(),
            DataError::NonFiniteAnswer { index: 1, .. }
        ));

        let dup = vec![participant("a", &[1.0, 2.0]), participant("a", &[1.0, 2.0])];
        assert_eq!(model.compute(&dup).unwrap_err(), DataError::DuplicateId("a".to_string()));

        let single = vec![participant("a", &[1.0]), participant("b", &[2.0])];
        assert!(matches!(
            model.compute(&single).unwrap_err(),
            DataError::TooFewAnswers { .. }
        ));
        assert!(SimilarityModel::new(SimilarityStrategy::Cosine { centered: false })
            .compute(&single)
            .is_ok());
    }
}
