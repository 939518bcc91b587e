//! Best-effort edge for actors that scored no qualifying edge.

use crate::rules::ENTRY_POINT_PATTERNS;
use crate::text::is_client_type;
use crate::{Actor, CandidateModule, Priority};

/// Client-type actors only get a fallback edge when their best score reaches this.
pub const CLIENT_FALLBACK_MIN_SCORE: u8 = 2;

/// Pick a fallback module for `actor` from its precomputed `scores`
/// (parallel to `modules`). Returns the module index and its score.
///
/// Ties resolve to the earliest module. When every score is zero, the first
/// must-have entry-point module wins, then the first entry-point module.
pub fn assign_fallback(
    actor: &Actor,
    modules: &[&CandidateModule],
    scores: &[u8],
) -> Option<(usize, u8)> {
    let best = scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, u8)>, (i, s)| match best {
            Some((_, top)) if top >= s => best,
            _ => Some((i, s)),
        });

    if is_client_type(&actor.name) {
        return best.filter(|&(_, s)| s >= CLIENT_FALLBACK_MIN_SCORE);
    }

    match best {
        Some((i, s)) if s > 0 => Some((i, s)),
        _ => entry_point(modules).map(|i| (i, 0)),
    }
}

fn entry_point(modules: &[&CandidateModule]) -> Option<usize> {
    let candidates: Vec<usize> = modules
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            let name = m.name.to_lowercase();
            ENTRY_POINT_PATTERNS.iter().any(|p| name.contains(p))
        })
        .map(|(i, _)| i)
        .collect();

    candidates
        .iter()
        .copied()
        .find(|&i| modules[i].priority == Priority::MustHave)
        .or_else(|| candidates.first().copied())
}
