use std::fmt;
use crate::models::{AnalysisReport, GradeBreakdown, MatchResult, MatchSummary, NamedResult};

/// Summary statistics for a single result
pub fn summarize_one(name: &str, result: &MatchResult) -> MatchSummary {
    let mut grades = GradeBreakdown::default();
    for pair in &result.pairs {
        match pair.grade_difference {
            None => grades.missing_grade_info += 1,
            Some(0) => {
                grades.same_grade_pairs += 1;
                *grades.histogram.entry(0).or_insert(0) += 1;
            }
            Some(gap) => {
                grades.different_grade_pairs += 1;
                *grades.histogram.entry(gap).or_insert(0) += 1;
            }
        }
    }

    MatchSummary {
        name: name.to_string(),
        total_pairs: result.pair_count(),
        unpaired: result.unpaired.len(),
        average_quality: result.mean_quality(),
        grades: if grades.graded_pairs() > 0 { Some(grades) } else { None },
    }
}

/// Summarize named results and pick the one with the best average quality.
///
/// Results without pairs report no average and never win the comparison.
/// Ties go to the earlier result.
pub fn summarize<'a, I>(results: I) -> AnalysisReport
where
    I: IntoIterator<Item = (&'a str, &'a MatchResult)>,
{
    let summaries: Vec<MatchSummary> = results
        .into_iter()
        .map(|(name, result)| summarize_one(name, result))
        .collect();

    let mut best: Option<(&str, f64)> = None;
    for s in &summaries {
        if let Some(q) = s.average_quality {
            if best.map(|(_, b)| q > b).unwrap_or(true) {
                best = Some((s.name.as_str(), q));
            }
        }
    }
    let best_quality = best.map(|(name, _)| name.to_string());

    AnalysisReport {
        summaries,
        best_quality,
    }
}

/// Convenience over `summarize` for engine output
pub fn summarize_named(results: &[NamedResult]) -> AnalysisReport {
    summarize(results.iter().map(|r| (r.name.as_str(), &r.result)))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Results:", self.name)?;
        writeln!(f, "{}", "-".repeat(30))?;
        writeln!(f, "Total Pairs: {}", self.total_pairs)?;
        writeln!(f, "Unpaired: {}", self.unpaired)?;
        match self.average_quality {
            Some(q) => writeln!(f, "Average Match Quality: {:.2}%", q * 100.0)?,
            None => writeln!(f, "Average Match Quality: N/A")?,
        }

        if let Some(grades) = &self.grades {
            let graded = grades.graded_pairs();
            writeln!(f)?;
            writeln!(f, "Grade Distribution:")?;
            writeln!(
                f,
                "Same Grade: {} ({:.1}%)",
                grades.same_grade_pairs,
                percent(grades.same_grade_pairs, graded)
            )?;
            writeln!(
                f,
                "Different Grade: {} ({:.1}%)",
                grades.different_grade_pairs,
                percent(grades.different_grade_pairs, graded)
            )?;
            writeln!(f)?;
            writeln!(f, "Grade Differences:")?;
            for (gap, count) in &grades.histogram {
                writeln!(
                    f,
                    "{} grade(s) apart: {} pairs ({:.1}%)",
                    gap,
                    count,
                    percent(*count, graded)
                )?;
            }
            if grades.missing_grade_info > 0 {
                writeln!(f)?;
                writeln!(f, "Pairs missing grade info: {}", grades.missing_grade_info)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Matching Analysis ===")?;
        for summary in &self.summaries {
            writeln!(f)?;
            write!(f, "{}", summary)?;
            writeln!(f)?;
            writeln!(f, "{}", "=".repeat(50))?;
        }

        writeln!(f)?;
        writeln!(f, "Comparative Analysis:")?;
        writeln!(f, "{}", "-".repeat(30))?;
        let best = self
            .best_quality
            .as_deref()
            .and_then(|name| self.summaries.iter().find(|s| s.name == name));
        match best.and_then(|s| s.average_quality.map(|q| (s, q))) {
            Some((s, q)) => writeln!(f, "Best average match quality: {} ({:.2}%)", s.name, q * 100.0),
            None => writeln!(f, "Best average match quality: N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pair;

    fn pair(a: &str, b: &str, quality: f64, gap: Option<u32>) -> Pair {
        Pair {
            first: a.to_string(),
            second: b.to_string(),
            quality,
            grade_difference: gap,
        }
    }

    #[test]
    fn test_zero_pairs_reports_not_applicable() {
        let empty = MatchResult::empty(&["a".to_string()]);
        let report = summarize([("Greedy", &empty)]);

        assert_eq!(report.summaries[0].average_quality, None);
        assert_eq!(report.summaries[0].grades, None);
        assert_eq!(report.best_quality, None);

        let text = report.to_string();
        assert!(text.contains("Average Match Quality: N/A"));
        assert!(text.contains("Best average match quality: N/A"));
    }

    #[test]
    fn test_grade_histogram() {
        let result = MatchResult {
            pairs: vec![
                pair("a", "b", 1.0, Some(0)),
                pair("c", "d", 0.5, Some(2)),
                pair("e", "f", 0.75, Some(2)),
                pair("g", "h", 0.25, None),
            ],
            unpaired: vec![],
        };
        let summary = summarize_one("Hungarian", &result);
        let grades = summary.grades.clone().unwrap();

        assert_eq!(summary.total_pairs, 4);
        assert_eq!(summary.average_quality, Some(0.625));
        assert_eq!(grades.same_grade_pairs, 1);
        assert_eq!(grades.different_grade_pairs, 2);
        assert_eq!(grades.missing_grade_info, 1);
        assert_eq!(grades.histogram.get(&0), Some(&1));
        assert_eq!(grades.histogram.get(&2), Some(&2));

        let text = summary.to_string();
        assert!(text.contains("2 grade(s) apart: 2 pairs (66.7%)"));
        assert!(text.contains("Pairs missing grade info: 1"));
    }

    #[test]
    fn test_best_quality_skips_empty_results() {
        let empty = MatchResult::default();
        let weak = MatchResult {
            pairs: vec![pair("a", "b", 0.4, None)],
            unpaired: vec![],
        };
        let strong = MatchResult {
            pairs: vec![pair("a", "b", 0.9, None)],
            unpaired: vec![],
        };
        let report = summarize([("Empty", &empty), ("Weak", &weak), ("Strong", &strong)]);
        assert_eq!(report.best_quality.as_deref(), Some("Strong"));
        assert!(report.to_string().contains("Best average match quality: Strong (90.00%)"));
    }
}
