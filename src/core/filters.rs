use std::collections::{HashMap, HashSet};
use crate::models::{CandidateList, CandidatePool, Participant, PreferenceMode, PreferenceRules, RunNotice};

/// Does a preference set accept a category?
///
/// A none token rejects everything; otherwise a wildcard token, a literal
/// code, or an equivalence-table entry for any declared code accepts.
#[inline]
pub fn accepts(rules: &PreferenceRules, preferences: &[String], category: &str) -> bool {
    let category = category.trim();

    if preferences.iter().any(|p| rules.is_none(p)) {
        return false;
    }
    if preferences.iter().any(|p| rules.is_wildcard(p)) {
        return true;
    }

    preferences.iter().any(|p| {
        let p = p.trim();
        p == category
            || rules
                .equivalences
                .get(p)
                .map(|accepted| accepted.iter().any(|a| a.trim() == category))
                .unwrap_or(false)
    })
}

/// Literal identity match only; wildcards and equivalences do not count
#[inline]
pub fn accepts_exact(preferences: &[String], category: &str) -> bool {
    let category = category.trim();
    preferences.iter().any(|p| p.trim() == category)
}

/// Mutual compatibility of two participants under the given mode.
///
/// Participants without category data are never compatible.
pub fn is_mutually_compatible(
    mode: PreferenceMode,
    rules: &PreferenceRules,
    a: &Participant,
    b: &Participant,
) -> bool {
    let (Some(cat_a), Some(cat_b)) = (a.category.as_deref(), b.category.as_deref()) else {
        return false;
    };

    let lenient = accepts(rules, &a.preferences, cat_b) && accepts(rules, &b.preferences, cat_a);
    match mode {
        PreferenceMode::Lenient => lenient,
        PreferenceMode::Strict => {
            lenient && accepts_exact(&a.preferences, cat_b) && accepts_exact(&b.preferences, cat_a)
        }
    }
}

/// Filtered candidate lists plus what happened to the participants along the way
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub pool: CandidatePool,
    /// Eligible participants left without any candidate
    pub no_matches: Vec<String>,
    /// Participants excluded for lack of category/preference data
    pub missing_preferences: Vec<String>,
    /// Isolated participants given candidates back, with how many
    pub recovered: Vec<(String, usize)>,
}

impl FilterOutcome {
    pub fn notices(&self) -> Vec<RunNotice> {
        let missing = self
            .missing_preferences
            .iter()
            .map(|id| RunNotice::PreferenceDataMissing { id: id.clone() });
        let recovered = self
            .recovered
            .iter()
            .map(|(id, count)| RunNotice::CandidatesRecovered {
                id: id.clone(),
                count: *count,
            });
        let isolated = self
            .no_matches
            .iter()
            .map(|id| RunNotice::NoFeasibleMatch { id: id.clone() });

        missing.chain(recovered).chain(isolated).collect()
    }
}

/// Prunes ranked candidate lists to mutually compatible candidates
#[derive(Debug, Clone, Default)]
pub struct PreferenceFilter {
    mode: PreferenceMode,
    rules: PreferenceRules,
    recover_isolated: bool,
}

impl PreferenceFilter {
    pub fn new(mode: PreferenceMode, rules: PreferenceRules) -> Self {
        Self {
            mode,
            rules,
            recover_isolated: false,
        }
    }

    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.recover_isolated = enabled;
        self
    }

    /// Build filtered views of `lists`; the input lists are left untouched.
    ///
    /// A participant lacking category or preference data is dropped both as
    /// a list owner and as a candidate. Rank order within each list is kept.
    pub fn filter(&self, lists: &[CandidateList], participants: &[Participant]) -> FilterOutcome {
        let by_id: HashMap<&str, &Participant> =
            participants.iter().map(|p| (p.id.as_str(), p)).collect();
        let eligible = |id: &str| by_id.get(id).map(|p| p.has_preference_data()).unwrap_or(false);

        let missing_preferences: Vec<String> = participants
            .iter()
            .filter(|p| !p.has_preference_data())
            .map(|p| p.id.clone())
            .collect();
        for id in &missing_preferences {
            tracing::warn!("Participant {} has no category/preference data, excluded", id);
        }

        let sources: Vec<&CandidateList> = lists.iter().filter(|l| eligible(&l.owner)).collect();

        // Directed edges owner -> candidate that survive the filter
        let mut edges: HashSet<(&str, &str)> = HashSet::new();
        for list in &sources {
            let owner = by_id[list.owner.as_str()];
            for candidate in list.ids() {
                if candidate == owner.id || !eligible(candidate) {
                    continue;
                }
                if is_mutually_compatible(self.mode, &self.rules, owner, by_id[candidate]) {
                    edges.insert((owner.id.as_str(), candidate));
                }
            }
        }

        let mut recovered = Vec::new();
        if self.recover_isolated {
            let isolated: Vec<&CandidateList> = sources
                .iter()
                .copied()
                .filter(|l| !l.ids().any(|c| edges.contains(&(l.owner.as_str(), c))))
                .collect();

            for list in isolated {
                let owner = by_id[list.owner.as_str()];
                let Some(category) = owner.category.as_deref() else {
                    continue;
                };
                let mut count = 0;
                for candidate in list.ids() {
                    if candidate == owner.id || !eligible(candidate) {
                        continue;
                    }
                    if accepts(&self.rules, &by_id[candidate].preferences, category) {
                        edges.insert((owner.id.as_str(), candidate));
                        edges.insert((candidate, owner.id.as_str()));
                        count += 1;
                    }
                }
                if count > 0 {
                    tracing::debug!("Recovered {} candidates for isolated participant {}", count, owner.id);
                    recovered.push((owner.id.clone(), count));
                }
            }
        }

        let filtered: Vec<CandidateList> = sources
            .iter()
            .map(|list| {
                let candidates = list
                    .candidates
                    .iter()
                    .filter(|c| edges.contains(&(list.owner.as_str(), c.id.as_str())))
                    .cloned()
                    .collect();
                CandidateList::new(list.owner.clone(), candidates)
            })
            .collect();

        let no_matches: Vec<String> = filtered
            .iter()
            .filter(|l| l.is_empty())
            .map(|l| l.owner.clone())
            .collect();

        tracing::debug!(
            "Preference filter ({:?}): {} lists kept, {} without matches, {} missing data",
            self.mode,
            filtered.len() - no_matches.len(),
            no_matches.len(),
            missing_preferences.len()
        );

        FilterOutcome {
            pool: CandidatePool::from_participants(participants, filtered),
            no_matches,
            missing_preferences,
            recovered,
        }
    }
}
