//! Keyword index
//!
//! Maps every configured keyword to the routes that declare it and scans a
//! message for all indexed keywords in one pass over the index. Pattern
//! groups are applied after keyword accumulation and only ever add to the
//! route they target.

use crate::config::{PatternGroup, RouteDefinition};
use crate::router::types::{sort_matches, ClassificationMatch};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Route reference stored under a keyword
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub route: String,
    pub weight: f64,
    pub priority: i32,
}

/// Immutable keyword → route lookup built from one configuration
#[derive(Debug, Clone)]
pub struct KeywordIndex {
    keywords: BTreeMap<String, Vec<IndexEntry>>,
    routes: BTreeMap<String, RouteDefinition>,
    pattern_groups: Vec<PatternGroup>,
    case_sensitive: bool,
}

impl KeywordIndex {
    /// Build the index
    ///
    /// Keywords and phrases are stored normalized, so analysis only has to
    /// normalize the message once.
    pub fn build(
        routes: &[RouteDefinition],
        pattern_groups: &[PatternGroup],
        case_sensitive: bool,
    ) -> Self {
        let normalize = |text: &str| {
            if case_sensitive {
                text.to_string()
            } else {
                text.to_lowercase()
            }
        };

        let mut keywords: BTreeMap<String, Vec<IndexEntry>> = BTreeMap::new();
        for route in routes {
            for keyword in &route.keywords {
                let entries = keywords.entry(normalize(keyword)).or_default();
                if entries.iter().any(|e| e.route == route.name) {
                    continue;
                }
                entries.push(IndexEntry {
                    route: route.name.clone(),
                    weight: route.weight,
                    priority: route.priority,
                });
            }
        }

        let route_map: BTreeMap<String, RouteDefinition> = routes
            .iter()
            .map(|r| (r.name.clone(), r.clone()))
            .collect();

        let pattern_groups: Vec<PatternGroup> = pattern_groups
            .iter()
            .filter(|group| {
                let known = route_map.contains_key(&group.target_route);
                if !known {
                    debug!(
                        group = %group.name,
                        target = %group.target_route,
                        "Pattern group targets an undefined route; skipping"
                    );
                }
                known
            })
            .map(|group| PatternGroup {
                phrases: group.phrases.iter().map(|p| normalize(p)).collect(),
                ..group.clone()
            })
            .collect();

        debug!(
            keywords = keywords.len(),
            routes = route_map.len(),
            pattern_groups = pattern_groups.len(),
            "Built keyword index"
        );

        Self {
            keywords,
            routes: route_map,
            pattern_groups,
            case_sensitive,
        }
    }

    /// Score every route against `message`
    ///
    /// Returns matches sorted by (priority asc, score desc); empty when no
    /// keyword or pattern phrase occurs in the message.
    pub fn analyze(&self, message: &str) -> Vec<ClassificationMatch> {
        if message.trim().is_empty() {
            return Vec::new();
        }

        let text = self.normalize(message);
        let mut by_route: BTreeMap<String, ClassificationMatch> = BTreeMap::new();

        for (keyword, entries) in &self.keywords {
            if !text.contains(keyword.as_str()) {
                continue;
            }
            for entry in entries {
                let m = by_route.entry(entry.route.clone()).or_insert_with(|| {
                    ClassificationMatch::new(&entry.route, entry.weight, entry.priority)
                });
                m.score += entry.weight;
                m.matched_keywords.push(keyword.clone());
            }
        }

        for group in &self.pattern_groups {
            let Some(phrase) = group.phrases.iter().find(|p| text.contains(p.as_str())) else {
                continue;
            };
            let Some(target) = self.routes.get(&group.target_route) else {
                continue;
            };

            trace!(group = %group.name, phrase = %phrase, "Pattern group matched");
            let m = by_route.entry(target.name.clone()).or_insert_with(|| {
                ClassificationMatch::new(&target.name, target.weight, target.priority)
            });
            m.score += group.bonus;
            m.matched_keywords.push(phrase.clone());
        }

        let mut matches: Vec<ClassificationMatch> = by_route.into_values().collect();
        sort_matches(&mut matches);
        matches
    }

    /// Normalize text the way keywords were normalized at build time
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.to_lowercase())
        }
    }

    pub fn route(&self, name: &str) -> Option<&RouteDefinition> {
        self.routes.get(name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.values()
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, keywords: &[&str], weight: f64, priority: i32) -> RouteDefinition {
        RouteDefinition {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weight,
            priority,
            endpoint: None,
        }
    }

    fn group(name: &str, phrases: &[&str], target: &str) -> PatternGroup {
        PatternGroup {
            name: name.to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            target_route: target.to_string(),
            bonus: 0.5,
        }
    }

    fn test_index() -> KeywordIndex {
        KeywordIndex::build(
            &[
                route("work", &["task", "plan"], 1.0, 1),
                route("chat", &["hello"], 0.8, 2),
                route("complex_reasoning", &["philosophy"], 1.2, 1),
            ],
            &[group("comparison", &["compare", "versus"], "complex_reasoning")],
            false,
        )
    }

    #[test]
    fn test_analyze_accumulates_weight_per_keyword() {
        let matches = test_index().analyze("I need to plan a task");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].route, "work");
        assert_eq!(matches[0].score, 2.0);
        assert_eq!(matches[0].matched_keywords, vec!["plan", "task"]);
    }

    #[test]
    fn test_analyze_case_insensitive() {
        let matches = test_index().analyze("HELLO there");
        assert_eq!(matches[0].route, "chat");
        assert!((matches[0].score - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_analyze_case_sensitive() {
        let index = KeywordIndex::build(&[route("chat", &["Hello"], 1.0, 1)], &[], true);
        assert!(index.analyze("hello").is_empty());
        assert_eq!(index.analyze("Hello").len(), 1);
    }

    #[test]
    fn test_pattern_group_creates_complex_match() {
        let matches = test_index().analyze("compare these two options");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].route, "complex_reasoning");
        assert_eq!(matches[0].score, 0.5);
        assert_eq!(matches[0].priority, 1);
        assert_eq!(matches[0].matched_keywords, vec!["compare"]);
    }

    #[test]
    fn test_pattern_group_bonus_applied_once_per_group() {
        let matches = test_index().analyze("compare rust versus go");
        let complex = matches.iter().find(|m| m.route == "complex_reasoning").unwrap();
        assert_eq!(complex.score, 0.5);
    }

    #[test]
    fn test_pattern_group_adds_to_existing_match() {
        let matches = test_index().analyze("compare philosophy schools");
        let complex = matches.iter().find(|m| m.route == "complex_reasoning").unwrap();
        assert!((complex.score - 1.7).abs() < 1e-9);
        assert_eq!(complex.matched_keywords, vec!["philosophy", "compare"]);
    }

    #[test]
    fn test_pattern_group_with_unknown_target_ignored() {
        let index = KeywordIndex::build(
            &[route("chat", &["hello"], 1.0, 1)],
            &[group("question", &["why"], "missing")],
            false,
        );
        assert!(index.analyze("why is the sky blue").is_empty());
    }

    #[test]
    fn test_matches_sorted_by_priority_then_score() {
        let matches = test_index().analyze("hello, plan my task");
        let order: Vec<&str> = matches.iter().map(|m| m.route.as_str()).collect();
        assert_eq!(order, vec!["work", "chat"]);
    }

    #[test]
    fn test_duplicate_keywords_counted_once() {
        let index = KeywordIndex::build(&[route("work", &["plan", "Plan"], 1.0, 1)], &[], false);
        assert_eq!(index.keyword_count(), 1);
        assert_eq!(index.analyze("plan")[0].score, 1.0);
    }

    #[test]
    fn test_empty_message() {
        assert!(test_index().analyze("   ").is_empty());
        assert!(test_index().analyze("").is_empty());
    }
}
