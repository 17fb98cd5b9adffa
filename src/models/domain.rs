use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Survey respondent with answers and declared identity/preference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub answers: Vec<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub grade: Option<i32>,
}

impl Participant {
    pub fn new(id: impl Into<String>, answers: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            answers,
            category: None,
            preferences: Vec::new(),
            grade: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_grade(mut self, grade: i32) -> Self {
        self.grade = Some(grade);
        self
    }

    /// True when both a category and at least one preference code are declared
    pub fn has_preference_data(&self) -> bool {
        self.category
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
            && self.preferences.iter().any(|p| !p.trim().is_empty())
    }
}

/// Absolute grade gap, if both grades are known
#[inline]
pub fn grade_gap(a: Option<i32>, b: Option<i32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.abs_diff(b)),
        _ => None,
    }
}

/// One ranked entry in a candidate list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub score: f64,
}

/// Candidates for one participant, best first, without self or duplicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    pub owner: String,
    pub candidates: Vec<Candidate>,
}

impl CandidateList {
    pub fn new(owner: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            owner: owner.into(),
            candidates,
        }
    }

    /// Build a list from ids already in rank order; scores descend from 1.0
    pub fn ranked<I, S>(owner: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let len = ids.len().max(1) as f64;
        let candidates = ids
            .into_iter()
            .enumerate()
            .map(|(rank, id)| Candidate {
                id,
                score: 1.0 - rank as f64 / len,
            })
            .collect();
        Self::new(owner, candidates)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.candidates.iter().any(|c| c.id == id)
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.id.as_str())
    }
}

/// Filtered matcher input: the candidate lists of every eligible participant,
/// the full roster (for the partition invariant) and known grades
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    roster: Vec<String>,
    lists: Vec<CandidateList>,
    index: HashMap<String, usize>,
    grades: HashMap<String, i32>,
}

impl CandidatePool {
    /// Empty lists are dropped; their owners stay on the roster and end up unpaired
    pub fn new(roster: Vec<String>, lists: Vec<CandidateList>, grades: HashMap<String, i32>) -> Self {
        let lists: Vec<CandidateList> = lists.into_iter().filter(|l| !l.is_empty()).collect();
        let index = lists
            .iter()
            .enumerate()
            .map(|(i, l)| (l.owner.clone(), i))
            .collect();

        Self {
            roster,
            lists,
            index,
            grades,
        }
    }

    pub fn from_participants(participants: &[Participant], lists: Vec<CandidateList>) -> Self {
        let roster = participants.iter().map(|p| p.id.clone()).collect();
        let grades = participants
            .iter()
            .filter_map(|p| p.grade.map(|g| (p.id.clone(), g)))
            .collect();
        Self::new(roster, lists, grades)
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn lists(&self) -> &[CandidateList] {
        &self.lists
    }

    pub fn list(&self, id: &str) -> Option<&CandidateList> {
        self.index.get(id).map(|&i| &self.lists[i])
    }

    /// Does `owner` list `candidate`?
    pub fn is_listed_by(&self, owner: &str, candidate: &str) -> bool {
        self.list(owner).map(|l| l.contains(candidate)).unwrap_or(false)
    }

    pub fn grade(&self, id: &str) -> Option<i32> {
        self.grades.get(id).copied()
    }

    pub fn grade_gap(&self, a: &str, b: &str) -> Option<u32> {
        grade_gap(self.grade(a), self.grade(b))
    }

    pub fn has_grades(&self) -> bool {
        !self.grades.is_empty()
    }

    /// Every id appearing as a list owner or a listed candidate, first appearance order
    pub fn universe(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for list in &self.lists {
            for id in std::iter::once(list.owner.as_str()).chain(list.ids()) {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

/// Two distinct participants paired by a matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub first: String,
    pub second: String,
    /// 1.0 is a perfect match
    pub quality: f64,
    /// `None` when either side has no grade
    #[serde(rename = "gradeDifference")]
    pub grade_difference: Option<u32>,
}

impl Pair {
    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }

    pub fn cost(&self) -> f64 {
        1.0 - self.quality
    }
}

/// Output of a single matcher invocation.
///
/// Every roster id is either in exactly one pair or in `unpaired`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub pairs: Vec<Pair>,
    pub unpaired: Vec<String>,
}

impl MatchResult {
    /// Everyone on the roster unpaired
    pub fn empty(roster: &[String]) -> Self {
        Self::from_pairs(Vec::new(), roster)
    }

    /// Unpaired set is the sorted complement of the paired ids within `roster`
    pub fn from_pairs(pairs: Vec<Pair>, roster: &[String]) -> Self {
        let paired: HashSet<&str> = pairs
            .iter()
            .flat_map(|p| [p.first.as_str(), p.second.as_str()])
            .collect();
        let unpaired: BTreeSet<String> = roster
            .iter()
            .filter(|id| !paired.contains(id.as_str()))
            .cloned()
            .collect();

        Self {
            pairs,
            unpaired: unpaired.into_iter().collect(),
        }
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn partner_of(&self, id: &str) -> Option<&str> {
        self.pairs.iter().find_map(|p| {
            if p.first == id {
                Some(p.second.as_str())
            } else if p.second == id {
                Some(p.first.as_str())
            } else {
                None
            }
        })
    }

    /// Sum of `1 - quality` over all pairs
    pub fn total_cost(&self) -> f64 {
        self.pairs.iter().map(Pair::cost).sum()
    }

    pub fn mean_quality(&self) -> Option<f64> {
        if self.pairs.is_empty() {
            return None;
        }
        Some(self.pairs.iter().map(|p| p.quality).sum::<f64>() / self.pairs.len() as f64)
    }

    /// No id appears in more than one pair, and no pair is a self-pair
    pub fn is_disjoint(&self) -> bool {
        let mut seen = HashSet::new();
        self.pairs.iter().all(|p| {
            p.first != p.second && seen.insert(p.first.as_str()) && seen.insert(p.second.as_str())
        })
    }

    /// Paired and unpaired ids together are exactly `roster`
    pub fn is_partition_of(&self, roster: &[String]) -> bool {
        if !self.is_disjoint() {
            return false;
        }
        let mut covered: Vec<&str> = self
            .pairs
            .iter()
            .flat_map(|p| [p.first.as_str(), p.second.as_str()])
            .chain(self.unpaired.iter().map(String::as_str))
            .collect();
        covered.sort_unstable();
        let before = covered.len();
        covered.dedup();
        if covered.len() != before {
            return false;
        }

        let mut expected: Vec<&str> = roster.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        covered == expected
    }
}
