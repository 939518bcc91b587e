//! Bounded relevance score for an (actor, module) pair.
//!
//! Each rule contributes independently; the sum is clamped to [`MAX_SCORE`].
//!
//! | rule                         | points |
//! |------------------------------|--------|
//! | description, strong match    | +2     |
//! | description, weak match      | +1     |
//! | module name match            | +2     |
//! | pain point corroboration     | +2     |
//! | goal alignment               | +1     |
//! | must-have priority           | +1     |
//! | management affinity          | +1     |

use std::collections::HashSet;

use crate::rules::{ANALYTICS_KEYWORDS, CO_MANAGER_RULES, MANAGEMENT_TOKENS};
use crate::text::{normalize, overlaps, strong_match, weak_match};
use crate::{Actor, CandidateModule, Priority, RequirementsSummary};

pub const MAX_SCORE: u8 = 9;

/// Descriptions with fewer tokens than this score zero outright.
const MIN_DESCRIPTION_TOKENS: usize = 2;

/// Score `actor` against `module`.
///
/// `actor_keywords` comes from [`crate::text::expand_role_keywords`];
/// `module_desc_words` and `module_name_words` from [`crate::text::normalize`].
pub fn score(
    actor: &Actor,
    module: &CandidateModule,
    summary: &RequirementsSummary,
    actor_keywords: &[String],
    module_desc_words: &HashSet<String>,
    module_name_words: &HashSet<String>,
) -> u8 {
    if module_desc_words.len() < MIN_DESCRIPTION_TOKENS {
        return 0;
    }

    let mut total: u8 = 0;

    if strong_match(actor_keywords, module_desc_words) {
        total += 2;
    } else if weak_match(actor_keywords, module_desc_words) {
        total += 1;
    }

    if strong_match(actor_keywords, module_name_words) {
        total += 2;
    }

    let corroborated = summary.pain_points.iter().any(|pain| {
        let pain_words = normalize(&pain.description);
        strong_match(actor_keywords, &pain_words) && overlaps(&pain_words, module_name_words)
    });
    if corroborated {
        total += 2;
    }

    let aligned = summary.goals().any(|goal| {
        let goal_words = normalize(goal);
        weak_match(actor_keywords, &goal_words) && overlaps(&goal_words, module_name_words)
    });
    if aligned {
        total += 1;
    }

    if module.priority == Priority::MustHave {
        total += 1;
    }

    if has_management_affinity(actor, actor_keywords, summary) && is_analytics_module(module) {
        total += 1;
    }

    total.min(MAX_SCORE)
}

/// Management role by keyword, or by a co-manager rule against the other actors.
pub fn has_management_affinity(
    actor: &Actor,
    actor_keywords: &[String],
    summary: &RequirementsSummary,
) -> bool {
    if actor_keywords
        .iter()
        .any(|k| MANAGEMENT_TOKENS.contains(&k.as_str()))
    {
        return true;
    }

    let name = actor.name.to_lowercase();
    CO_MANAGER_RULES.iter().any(|rule| {
        name.contains(rule.actor_marker)
            && summary.actors.iter().any(|other| {
                other.name != actor.name && other.name.to_lowercase().contains(rule.partner_marker)
            })
    })
}

fn is_analytics_module(module: &CandidateModule) -> bool {
    let name = module.name.to_lowercase();
    ANALYTICS_KEYWORDS.iter().any(|k| name.contains(k))
}
