//! Greedy budget packing.
//!
//! Walks the ranked list once. Candidates are included until the first one
//! that does not fit; from there on every injectable candidate is recorded
//! as budget-excluded. Inclusion is therefore always a prefix of the ranked
//! injectable candidates, so a larger budget never drops a skill that a
//! smaller one included. This trades knapsack optimality for predictability.

use skillctx_types::bundle::{ExcludedSkill, ExclusionReason, InjectedSkill, InjectionBundle};
use skillctx_types::query::{Budget, MatchCandidate};

use super::index::CorpusIndex;

/// Select skill bodies from `ranked` under `budget`.
///
/// Skills with `context: manual` are never packed; they are listed as
/// `manual_only` exclusions and do not count towards truncation.
pub fn pack(ranked: &[MatchCandidate], index: &CorpusIndex, budget: Budget) -> InjectionBundle {
    let mut bundle = InjectionBundle::empty(budget, index.generation());

    for candidate in ranked {
        let Some(record) = index.get(&candidate.skill_id) else {
            tracing::warn!(
                skill = %candidate.skill_id,
                generation = index.generation(),
                "Ranked candidate missing from corpus index, skipping"
            );
            continue;
        };

        if !record.context_inject {
            bundle.excluded.push(ExcludedSkill {
                id: record.id.clone(),
                reason: ExclusionReason::ManualOnly,
            });
            continue;
        }

        let fits = !bundle.truncated
            && bundle
                .total_tokens
                .checked_add(record.token_cost)
                .is_some_and(|total| total <= budget.get());

        if fits {
            bundle.total_tokens += record.token_cost;
            bundle.skills.push(InjectedSkill {
                id: record.id.clone(),
                title: record.title.clone(),
                body: record.body.clone(),
                token_cost: record.token_cost,
                score: candidate.score,
            });
        } else {
            if !bundle.truncated {
                tracing::debug!(
                    skill = %record.id,
                    cost = record.token_cost,
                    used = bundle.total_tokens,
                    budget = budget.get(),
                    "Budget exhausted"
                );
            }
            bundle.truncated = true;
            bundle.excluded.push(ExcludedSkill {
                id: record.id.clone(),
                reason: ExclusionReason::Budget,
            });
        }
    }

    bundle
}
