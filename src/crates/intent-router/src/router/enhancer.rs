//! Context enhancement
//!
//! Short follow-ups ("and the second one?") rarely repeat the topic keywords.
//! The enhancer looks at the last few conversation messages and reinforces
//! routes whose own keywords keep appearing there.

use crate::context::{recent_text, ConversationTurn, ENHANCEMENT_WINDOW};
use crate::router::index::KeywordIndex;
use crate::router::types::{sort_matches, ClassificationMatch};
use tracing::trace;

/// Score added per route keyword found in recent context
pub const CONTEXT_BOOST: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct ContextEnhancer {
    window: usize,
    boost: f64,
}

impl Default for ContextEnhancer {
    fn default() -> Self {
        Self {
            window: ENHANCEMENT_WINDOW,
            boost: CONTEXT_BOOST,
        }
    }
}

impl ContextEnhancer {
    pub fn new(window: usize, boost: f64) -> Self {
        Self { window, boost }
    }

    /// Re-score `matches` against recent context and re-sort them
    ///
    /// Only routes that already matched the message are boosted; context
    /// alone never introduces a new route.
    pub fn enhance(
        &self,
        index: &KeywordIndex,
        mut matches: Vec<ClassificationMatch>,
        context: &[ConversationTurn],
    ) -> Vec<ClassificationMatch> {
        if matches.is_empty() || context.is_empty() || self.window == 0 {
            return matches;
        }

        let recent = recent_text(context, self.window);
        let recent = index.normalize(&recent);

        for m in matches.iter_mut() {
            let Some(route) = index.route(&m.route) else {
                continue;
            };

            let mut seen: Vec<String> = Vec::new();
            for keyword in &route.keywords {
                let keyword = index.normalize(keyword).into_owned();
                if !seen.contains(&keyword) && recent.contains(keyword.as_str()) {
                    seen.push(keyword);
                }
            }

            let hits = seen.len();
            if hits > 0 {
                m.score += self.boost * hits as f64;
                m.context_enhanced = true;
                trace!(route = %m.route, hits, "Context reinforced route");
            }
        }

        sort_matches(&mut matches);
        matches
    }
}
