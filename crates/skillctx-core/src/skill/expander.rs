//! Transitive inclusion over `related` edges.
//!
//! Each seed runs its own breadth-first walk with a private visited set, so
//! cycles and self-references terminate and a skill reached from two seeds
//! yields two candidates (the ranker merges them).

use std::collections::{HashSet, VecDeque};

use skillctx_types::query::{MatchCandidate, MatchReason};

use super::index::CorpusIndex;

/// Seeds unchanged, followed by one candidate per (seed, reached skill).
///
/// A skill reached after `h` hops scores `seed.score × decay^h`. Walks stop
/// at `max_hops`; a zero `max_hops` returns the seeds alone. Reached skills
/// whose decayed score is zero are not emitted.
pub fn expand(
    index: &CorpusIndex,
    seeds: &[MatchCandidate],
    max_hops: u32,
    decay: f64,
) -> Vec<MatchCandidate> {
    let mut out = seeds.to_vec();
    if max_hops == 0 {
        return out;
    }

    let mut edges_visited = 0usize;

    for seed in seeds {
        let Some(start) = index.position(&seed.skill_id) else {
            continue;
        };

        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0u32, seed.score)]);

        while let Some((pos, hops, score)) = queue.pop_front() {
            if hops >= max_hops {
                continue;
            }
            let next_hops = hops + 1;
            let next_score = score * decay;

            for next in index.related_positions(pos) {
                edges_visited += 1;
                if !visited.insert(next) {
                    continue;
                }
                queue.push_back((next, next_hops, next_score));

                if next_score <= 0.0 {
                    continue;
                }
                let record = index.record(next);
                out.push(
                    MatchCandidate::new(&record.id, next_score, record.priority).with_reason(
                        MatchReason::Related {
                            from: seed.skill_id.clone(),
                            hops: next_hops,
                        },
                    ),
                );
            }
        }
    }

    tracing::debug!(
        seeds = seeds.len(),
        expanded = out.len() - seeds.len(),
        edges_visited,
        max_hops,
        "Expanded related skills"
    );

    out
}
