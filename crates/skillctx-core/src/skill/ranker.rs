//! Candidate merging, authored supersession, and final ordering.

use std::collections::{BTreeMap, HashMap, HashSet};

use skillctx_types::query::{MatchCandidate, MatchReason};

use super::index::CorpusIndex;

/// Ranker output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// One candidate per skill id, best first.
    pub ranked: Vec<MatchCandidate>,
    /// `(dropped, absorber)` pairs removed by `supersedes`.
    pub superseded: Vec<(String, String)>,
}

/// Fold candidates sharing an id: max score, union of reasons.
///
/// Output is ordered by id.
pub fn merge_candidates(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut merged: BTreeMap<String, MatchCandidate> = BTreeMap::new();
    for candidate in candidates {
        match merged.get_mut(&candidate.skill_id) {
            Some(existing) => existing.merge(candidate),
            None => {
                merged.insert(candidate.skill_id.clone(), candidate);
            }
        }
    }
    merged.into_values().collect()
}

/// Merge, apply supersession, and sort by score desc, priority desc, id asc.
///
/// Supersession walks the merged list in rank order. A surviving candidate
/// absorbs every present candidate it supersedes: it keeps the higher of
/// the two scores, gains the other's reasons plus `absorbed(<id>)`, and the
/// other is dropped. When two skills supersede each other the higher-ranked
/// one wins.
pub fn rank(index: &CorpusIndex, candidates: Vec<MatchCandidate>) -> Ranking {
    let mut merged = merge_candidates(candidates);
    merged.sort_by(MatchCandidate::rank_cmp);

    let slots: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, c)| (c.skill_id.clone(), i))
        .collect();
    let mut dropped: HashSet<usize> = HashSet::new();
    let mut superseded = Vec::new();

    for i in 0..merged.len() {
        if dropped.contains(&i) {
            continue;
        }
        let Some(record) = index.get(&merged[i].skill_id) else {
            continue;
        };

        for target in &record.supersedes {
            let Some(&j) = slots.get(target) else {
                continue;
            };
            if j == i || !dropped.insert(j) {
                continue;
            }

            let score = merged[j].score;
            let reasons = merged[j].reasons.clone();
            let absorber = &mut merged[i];
            if score > absorber.score {
                absorber.score = score;
            }
            for reason in reasons {
                absorber.add_reason(reason);
            }
            absorber.add_reason(MatchReason::Absorbed {
                skill: target.clone(),
            });

            tracing::debug!(
                skill = %absorber.skill_id,
                superseded = %target,
                "Skill absorbed a superseded candidate"
            );
            superseded.push((target.clone(), absorber.skill_id.clone()));
        }
    }

    let mut ranked: Vec<MatchCandidate> = merged
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, c)| c)
        .collect();
    // Absorbing can raise a score.
    ranked.sort_by(MatchCandidate::rank_cmp);

    Ranking { ranked, superseded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::testing::{estimator, raw};
    use skillctx_types::skill::ListField;

    fn cand(id: &str, score: f64) -> MatchCandidate {
        MatchCandidate::new(id, score, 0)
    }

    fn ids(ranking: &Ranking) -> Vec<&str> {
        ranking.ranked.iter().map(|c| c.skill_id.as_str()).collect()
    }

    #[test]
    fn merge_keeps_one_entry_per_id() {
        let merged = merge_candidates(vec![
            cand("b", 1.0),
            cand("a", 2.0),
            cand("b", 4.0),
            cand("a", 0.5),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].skill_id, "a");
        assert_eq!(merged[0].score, 2.0);
        assert_eq!(merged[1].score, 4.0);
    }

    #[test]
    fn rank_orders_by_score_then_priority_then_id() {
        let corpus = vec![
            raw("a", &[], &[], Some(1)),
            raw("b", &[], &[], Some(1)),
            raw("c", &[], &[], Some(1)),
        ];
        let index = CorpusIndex::load(corpus, &estimator(), 0).unwrap();
        let ranking = rank(
            &index,
            vec![
                cand("b", 3.0),
                cand("c", 6.0),
                MatchCandidate::new("a", 3.0, 1),
                cand("b", 1.5),
            ],
        );
        assert_eq!(ids(&ranking), vec!["c", "a", "b"]);
        assert!(ranking.superseded.is_empty());
    }

    #[test]
    fn specific_skill_absorbs_generic_one() {
        let mut infra = raw("security-infra", &["csp"], &[], Some(1));
        infra.metadata.supersedes = ListField::from(vec!["security"]);
        let generic = raw("security", &["security"], &[], Some(1));
        let other = raw("logging", &["logs"], &[], Some(1));
        let index = CorpusIndex::load(vec![infra, generic, other], &estimator(), 0).unwrap();

        let ranking = rank(
            &index,
            vec![
                cand("security", 9.0).with_reason(MatchReason::Trigger {
                    phrase: "security".into(),
                }),
                cand("security-infra", 3.0),
                cand("logging", 5.0),
            ],
        );

        assert_eq!(ids(&ranking), vec!["security-infra", "logging"]);
        let top = &ranking.ranked[0];
        assert_eq!(top.score, 9.0);
        assert!(top.reasons.contains(&MatchReason::Absorbed {
            skill: "security".into()
        }));
        assert!(top.reasons.contains(&MatchReason::Trigger {
            phrase: "security".into()
        }));
        assert_eq!(
            ranking.superseded,
            vec![("security".to_owned(), "security-infra".to_owned())]
        );
    }

    #[test]
    fn mutual_supersession_favours_higher_rank() {
        let mut a = raw("a", &[], &[], Some(1));
        a.metadata.supersedes = ListField::from(vec!["b"]);
        let mut b = raw("b", &[], &[], Some(1));
        b.metadata.supersedes = ListField::from(vec!["a"]);
        let index = CorpusIndex::load(vec![a, b], &estimator(), 0).unwrap();

        let ranking = rank(&index, vec![cand("a", 1.0), cand("b", 2.0)]);
        assert_eq!(ids(&ranking), vec!["b"]);
        assert_eq!(ranking.superseded, vec![("a".to_owned(), "b".to_owned())]);
    }

    #[test]
    fn supersedes_without_candidate_is_a_no_op() {
        let mut infra = raw("security-infra", &[], &[], Some(1));
        infra.metadata.supersedes = ListField::from(vec!["security"]);
        let generic = raw("security", &[], &[], Some(1));
        let index = CorpusIndex::load(vec![infra, generic], &estimator(), 0).unwrap();

        let ranking = rank(&index, vec![cand("security-infra", 3.0)]);
        assert_eq!(ids(&ranking), vec!["security-infra"]);
        assert!(ranking.superseded.is_empty());
        assert!(ranking.ranked[0].reasons.is_empty());
    }

    #[test]
    fn empty_input_ranks_empty() {
        let index = CorpusIndex::empty(0);
        assert_eq!(rank(&index, Vec::new()), Ranking::default());
    }
}
