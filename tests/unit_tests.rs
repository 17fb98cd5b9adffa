// Unit tests for the pairing engine building blocks

use pairing_engine::core::{
    accepts, blend, geometry::{cosine_similarity, distance_profile, form_points},
    grade_penalty, is_mutually_compatible, rank_cost, solve, CostMatrix, CostTable, SimilarityModel,
    NO_EDGE_COST,
};
use pairing_engine::models::{
    CandidateList, CandidatePool, GradeBlend, GradePenaltyTable, Participant, PointPairing, PreferenceMode,
    PreferenceRules, SimilarityStrategy,
};
use pairing_engine::DataError;
use std::collections::HashMap;

fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn create_test_participant(id: &str, category: &str, preferences: &[&str]) -> Participant {
    Participant::new(id, vec![1.0, 2.0, 3.0])
        .with_category(category)
        .with_preferences(preferences.iter().copied())
}

#[test]
fn test_all_pairs_point_count() {
    let points = form_points(&[1.0, 2.0, 3.0, 4.0], PointPairing::AllPairs);
    assert_eq!(points.len(), 6);
}

#[test]
fn test_consecutive_points_pair_odd_tail_with_itself() {
    let points = form_points(&[1.0, 2.0, 7.0], PointPairing::Consecutive);
    assert_eq!(points.len(), 2);
    assert_eq!((points[1].x, points[1].y), (7.0, 7.0));
}

#[test]
fn test_distance_profile_is_translation_invariant() {
    let a = distance_profile(&[1.0, 2.0, 4.0, 8.0], PointPairing::AllPairs);
    let b = distance_profile(&[11.0, 12.0, 14.0, 18.0], PointPairing::AllPairs);
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-9);
    }
}

#[test]
fn test_cosine_of_zero_vector_is_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-12);
}

#[test]
fn test_geometric_needs_two_answers() {
    let people = vec![Participant::new("a", vec![1.0]), Participant::new("b", vec![2.0])];
    let err = SimilarityModel::default().compute(&people).unwrap_err();
    assert_eq!(err, DataError::TooFewAnswers { needed: 2, found: 1 });

    // Cosine works on a single answer
    let cosine = SimilarityModel::new(SimilarityStrategy::Cosine { centered: false });
    assert!(cosine.compute(&people).is_ok());
}

#[test]
fn test_candidate_lists_exclude_self_and_rank_descending() {
    let people = vec![
        Participant::new("a", vec![1.0, 2.0, 3.0]),
        Participant::new("b", vec![1.0, 2.0, 3.1]),
        Participant::new("c", vec![9.0, 1.0, 5.0]),
    ];
    let matrix = SimilarityModel::default().compute(&people).unwrap();
    assert_eq!(matrix.score("a", "a"), None);

    for list in matrix.candidate_lists() {
        assert!(!list.contains(&list.owner));
        assert_eq!(list.len(), 2);
        let scores: Vec<f64> = list.candidates.iter().map(|c| c.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
    let a = matrix.candidate_lists().into_iter().find(|l| l.owner == "a").unwrap();
    assert_eq!(a.rank_of("b"), Some(0));
}

#[test]
fn test_preference_tokens() {
    let rules = PreferenceRules::default().with_equivalence("queer", ["nb", "f"]);

    assert!(accepts(&rules, &tokens(&["Any"]), "m"));
    assert!(accepts(&rules, &tokens(&["no preference"]), "m"));
    assert!(!accepts(&rules, &tokens(&["none", "any"]), "m"));
    assert!(accepts(&rules, &tokens(&["queer"]), "nb"));
    assert!(!accepts(&rules, &tokens(&["queer"]), "m"));
}

#[test]
fn test_strict_mode_ignores_wildcards() {
    let rules = PreferenceRules::default();
    let ann = create_test_participant("ann", "f", &["any"]);
    let bob = create_test_participant("bob", "m", &["f"]);

    assert!(is_mutually_compatible(PreferenceMode::Lenient, &rules, &ann, &bob));
    assert!(!is_mutually_compatible(PreferenceMode::Strict, &rules, &ann, &bob));

    let ann = create_test_participant("ann", "f", &["m"]);
    assert!(is_mutually_compatible(PreferenceMode::Strict, &rules, &ann, &bob));
}

#[test]
fn test_compatibility_is_symmetric() {
    let rules = PreferenceRules::default();
    let people = [
        create_test_participant("a", "f", &["m"]),
        create_test_participant("b", "m", &["any"]),
        create_test_participant("c", "nb", &["f", "nb"]),
        create_test_participant("d", "f", &["none"]),
    ];
    for mode in [PreferenceMode::Lenient, PreferenceMode::Strict] {
        for x in &people {
            for y in &people {
                assert_eq!(
                    is_mutually_compatible(mode, &rules, x, y),
                    is_mutually_compatible(mode, &rules, y, x)
                );
            }
        }
    }
}

#[test]
fn test_cost_helpers() {
    assert_eq!(rank_cost(0, 4), 0.0);
    assert_eq!(rank_cost(2, 4), 0.5);
    assert_eq!(grade_penalty(0), 0.0);
    assert_eq!(grade_penalty(1), 0.3);
    assert_eq!(grade_penalty(2), 0.6);
    assert_eq!(grade_penalty(7), 1.0);
    assert_eq!(blend(0.2, 1.0, 0.0), 0.2);
    assert_eq!(blend(0.2, 1.0, 1.0), 1.0);
}

#[test]
fn test_cost_table_is_symmetric_minimum() {
    let lists = vec![
        CandidateList::ranked("a", ["c", "b"]),
        CandidateList::ranked("b", ["a"]),
        CandidateList::ranked("c", ["b", "a"]),
    ];
    let roster = lists.iter().map(|l| l.owner.clone()).collect();
    let pool = CandidatePool::new(roster, lists, HashMap::new());
    let table = CostTable::from_pool(&pool, None);

    assert_eq!(table.cost("a", "b"), Some(0.0));
    assert_eq!(table.cost("b", "a"), Some(0.0));
    assert_eq!(table.cost("a", "c"), Some(0.0));
    assert_eq!(table.cost("b", "c"), Some(0.0));
    assert_eq!(table.cost("a", "a"), None);
}

#[test]
fn test_cost_table_blends_known_grades_only() {
    let lists = vec![
        CandidateList::ranked("a", ["b", "c"]),
        CandidateList::ranked("b", ["a"]),
        CandidateList::ranked("c", ["a"]),
    ];
    let roster = lists.iter().map(|l| l.owner.clone()).collect();
    let grades = HashMap::from([("a".to_string(), 10), ("b".to_string(), 12)]);
    let pool = CandidatePool::new(roster, lists, grades);
    let blend = GradeBlend {
        weight: 0.5,
        penalty: GradePenaltyTable::default(),
        max_difference: None,
    };
    let table = CostTable::from_pool(&pool, Some(&blend));

    // gap 2 -> penalty 0.6, blended with rank cost 0
    assert!((table.cost("a", "b").unwrap() - 0.3).abs() < 1e-12);
    // c has no grade: plain rank cost
    assert_eq!(table.cost("a", "c"), Some(0.0));
}

#[test]
fn test_solver_prefers_real_edges_over_sentinel() {
    let mut matrix = CostMatrix::filled(4, NO_EDGE_COST);
    matrix.set_symmetric(0, 1, 0.2);
    matrix.set_symmetric(2, 3, 0.4);
    matrix.set_symmetric(0, 2, 0.1);

    let assignment = solve(&matrix);
    let mut seen = assignment.row_to_col.clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
    assert!(assignment.total_cost < NO_EDGE_COST);
}
