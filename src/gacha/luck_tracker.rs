//! Per-user pull history and luck ratings.
//!
//! Every user keeps the rarity of their most recent pulls, oldest first,
//! capped at `max_history` entries. Ratings are looked up in caller-supplied
//! threshold tables where the first matching rule wins.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;

use crate::gacha::draw_engine::Drawable;

/// History cap when none is configured.
pub const DEFAULT_MAX_HISTORY: usize = 500;

/// Window used by lucky rules that omit one.
pub const DEFAULT_LUCK_WINDOW: usize = 10;

const DEFAULT_RATING: &str = "普通";
const DEFAULT_UNLUCKY_MESSAGE: &str = "运气尚可";
const DEFAULT_LUCKY_MESSAGE: &str = "运气普通";

fn default_rating() -> String {
    DEFAULT_RATING.to_string()
}

fn default_window() -> usize {
    DEFAULT_LUCK_WINDOW
}

/// 非酋 rule: matches when pulls since the last top-rarity hit reach `threshold`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnluckyRule {
    #[serde(default)]
    pub threshold: usize,
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default)]
    pub message: String,
}

/// 欧皇 rule: matches when the last `window` pulls hold at least
/// `threshold` top-rarity hits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LuckyRule {
    #[serde(default)]
    pub threshold: usize,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default)]
    pub message: String,
}

/// Outcome of an unlucky evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnluckyVerdict {
    pub rating: String,
    pub message: String,
    pub pulls_since_top: usize,
}

/// Outcome of a lucky evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LuckyVerdict {
    pub rating: String,
    pub message: String,
    pub top_count: usize,
    pub window: usize,
}

/// In-memory pull history for every user seen by one plugin instance.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    max_history: usize,
    top_rarity: String,
    histories: HashMap<String, VecDeque<String>>,
}

impl HistoryTracker {
    /// `max_history` below 1 is raised to 1.
    pub fn new(max_history: usize, top_rarity: impl Into<String>) -> Self {
        HistoryTracker {
            max_history: max_history.max(1),
            top_rarity: top_rarity.into(),
            histories: HashMap::new(),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn top_rarity(&self) -> &str {
        &self.top_rarity
    }

    /// Number of users with a recorded history.
    pub fn user_count(&self) -> usize {
        self.histories.len()
    }

    /// A user's retained pulls, oldest first.
    pub fn history(&self, user_id: &str) -> Option<&VecDeque<String>> {
        self.histories.get(user_id)
    }

    /// Append one pull, dropping the oldest entries beyond the cap.
    pub fn record_pull(&mut self, user_id: &str, rarity: &str) {
        let history = self.histories.entry(user_id.to_string()).or_default();
        history.push_back(rarity.to_string());
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    /// Record a batch of draw results in order.
    pub fn record_pulls<T: Drawable>(&mut self, user_id: &str, results: &[T]) {
        for item in results {
            self.record_pull(user_id, item.rarity());
        }
    }

    /// Pulls made after the most recent `label`.
    ///
    /// A user who never pulled `label` gets their whole history length;
    /// a user with no history gets 0.
    pub fn pulls_since(&self, user_id: &str, label: &str) -> usize {
        match self.histories.get(user_id) {
            Some(history) => history
                .iter()
                .rev()
                .position(|rarity| rarity == label)
                .unwrap_or(history.len()),
            None => 0,
        }
    }

    pub fn pulls_since_top_rarity(&self, user_id: &str) -> usize {
        self.pulls_since(user_id, &self.top_rarity)
    }

    /// Occurrences of `label` among the last `min(window, len)` pulls.
    pub fn count_in_window(&self, user_id: &str, window: usize, label: &str) -> usize {
        self.histories.get(user_id).map_or(0, |history| {
            history
                .iter()
                .rev()
                .take(window)
                .filter(|rarity| *rarity == label)
                .count()
        })
    }

    pub fn top_rarity_count_in_window(&self, user_id: &str, window: usize) -> usize {
        self.count_in_window(user_id, window, &self.top_rarity)
    }

    pub fn total_pulls(&self, user_id: &str) -> usize {
        self.histories.get(user_id).map_or(0, VecDeque::len)
    }

    /// Share of retained pulls that were `label`, as a percentage.
    pub fn rate(&self, user_id: &str, label: &str) -> f64 {
        let history = match self.histories.get(user_id) {
            Some(h) if !h.is_empty() => h,
            _ => return 0.0,
        };
        let hits = history.iter().filter(|rarity| *rarity == label).count();
        hits as f64 * 100.0 / history.len() as f64
    }

    pub fn top_rarity_rate(&self, user_id: &str) -> f64 {
        self.rate(user_id, &self.top_rarity)
    }

    /// 非酋指数. Rules are scanned in the given order; the first whose
    /// threshold does not exceed the drought length wins.
    pub fn evaluate_unlucky(&self, user_id: &str, rules: &[UnluckyRule]) -> UnluckyVerdict {
        let pulls_since_top = self.pulls_since_top_rarity(user_id);

        for rule in rules {
            if pulls_since_top >= rule.threshold {
                return UnluckyVerdict {
                    rating: rule.rating.clone(),
                    message: rule.message.clone(),
                    pulls_since_top,
                };
            }
        }

        UnluckyVerdict {
            rating: DEFAULT_RATING.to_string(),
            message: DEFAULT_UNLUCKY_MESSAGE.to_string(),
            pulls_since_top,
        }
    }

    /// 欧皇指数. Each rule counts top-rarity hits over its own window; the
    /// first rule whose count reaches its threshold wins.
    pub fn evaluate_lucky(&self, user_id: &str, rules: &[LuckyRule]) -> LuckyVerdict {
        for rule in rules {
            let top_count = self.top_rarity_count_in_window(user_id, rule.window);
            if top_count >= rule.threshold {
                return LuckyVerdict {
                    rating: rule.rating.clone(),
                    message: rule.message.clone(),
                    top_count,
                    window: rule.window,
                };
            }
        }

        LuckyVerdict {
            rating: DEFAULT_RATING.to_string(),
            message: DEFAULT_LUCKY_MESSAGE.to_string(),
            top_count: 0,
            window: DEFAULT_LUCK_WINDOW,
        }
    }

    /// Forget a user entirely. Returns whether anything was removed.
    pub fn clear_history(&mut self, user_id: &str) -> bool {
        self.histories.remove(user_id).is_some()
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        HistoryTracker::new(DEFAULT_MAX_HISTORY, "SSS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(user: &str, pulls: &[&str]) -> HistoryTracker {
        let mut tracker = HistoryTracker::default();
        for rarity in pulls {
            tracker.record_pull(user, rarity);
        }
        tracker
    }

    fn unlucky(threshold: usize, rating: &str) -> UnluckyRule {
        UnluckyRule { threshold, rating: rating.to_string(), message: format!("{} msg", rating) }
    }

    fn lucky(threshold: usize, window: usize, rating: &str) -> LuckyRule {
        LuckyRule { threshold, window, rating: rating.to_string(), message: format!("{} msg", rating) }
    }

    #[test]
    fn test_history_cap_keeps_most_recent() {
        let mut tracker = HistoryTracker::new(5, "SSS");
        for i in 0..12 {
            tracker.record_pull("u1", &format!("R{}", i));
            assert!(tracker.total_pulls("u1") <= 5);
        }
        let kept: Vec<&str> = tracker.history("u1").unwrap().iter().map(String::as_str).collect();
        assert_eq!(kept, vec!["R7", "R8", "R9", "R10", "R11"]);
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        let mut tracker = HistoryTracker::new(0, "SSS");
        tracker.record_pull("u1", "S");
        tracker.record_pull("u1", "SSS");
        assert_eq!(tracker.max_history(), 1);
        assert_eq!(tracker.total_pulls("u1"), 1);
        assert_eq!(tracker.pulls_since_top_rarity("u1"), 0);
    }

    #[test]
    fn test_record_pulls_in_order() {
        #[derive(Clone)]
        struct Pull(&'static str);
        impl Drawable for Pull {
            fn rarity(&self) -> &str { self.0 }
        }

        let mut tracker = HistoryTracker::default();
        tracker.record_pulls("u1", &[Pull("S"), Pull("SSS"), Pull("SS")]);
        let kept: Vec<&str> = tracker.history("u1").unwrap().iter().map(String::as_str).collect();
        assert_eq!(kept, vec!["S", "SSS", "SS"]);
    }

    #[test]
    fn test_pulls_since_top_rarity() {
        let tracker = tracker_with("u1", &["S", "SS", "SSS", "S", "S"]);
        assert_eq!(tracker.pulls_since_top_rarity("u1"), 2);

        let dry = tracker_with("u2", &["S", "SS", "S"]);
        assert_eq!(dry.pulls_since_top_rarity("u2"), 3);

        assert_eq!(dry.pulls_since_top_rarity("nobody"), 0);

        let fresh = tracker_with("u3", &["S", "SSS"]);
        assert_eq!(fresh.pulls_since_top_rarity("u3"), 0);
    }

    #[test]
    fn test_pulls_since_custom_label() {
        let tracker = tracker_with("u1", &["SS", "S", "S"]);
        assert_eq!(tracker.pulls_since("u1", "SS"), 2);
    }

    #[test]
    fn test_count_in_window() {
        let tracker = tracker_with("u1", &["SSS", "S", "SSS", "S", "SSS"]);
        // Last three: SSS, S, SSS
        assert_eq!(tracker.top_rarity_count_in_window("u1", 3), 2);
        assert_eq!(tracker.top_rarity_count_in_window("u1", 1), 1);
        assert_eq!(tracker.top_rarity_count_in_window("u1", 0), 0);
        assert_eq!(tracker.count_in_window("u1", 5, "S"), 2);
    }

    #[test]
    fn test_count_window_clamps_to_short_history() {
        let tracker = tracker_with("u1", &["SSS", "S"]);
        assert_eq!(tracker.top_rarity_count_in_window("u1", 10), 1);
        assert_eq!(tracker.top_rarity_count_in_window("u1", 2), 1);
        assert_eq!(tracker.top_rarity_count_in_window("u1", usize::MAX), 1);
        assert_eq!(tracker.top_rarity_count_in_window("nobody", 10), 0);
    }

    #[test]
    fn test_total_and_rate() {
        let tracker = tracker_with("u1", &["SSS", "S", "S", "S"]);
        assert_eq!(tracker.total_pulls("u1"), 4);
        assert!((tracker.top_rarity_rate("u1") - 25.0).abs() < 1e-9);
        assert!((tracker.rate("u1", "S") - 75.0).abs() < 1e-9);
        assert_eq!(tracker.top_rarity_rate("nobody"), 0.0);
    }

    #[test]
    fn test_evaluate_unlucky_first_match() {
        let mut tracker = HistoryTracker::default();
        for _ in 0..75 {
            tracker.record_pull("u1", "S");
        }
        let rules = vec![unlucky(100, "超级非酋"), unlucky(50, "非酋"), unlucky(0, "普通人")];

        let verdict = tracker.evaluate_unlucky("u1", &rules);
        assert_eq!(verdict.rating, "非酋");
        assert_eq!(verdict.message, "非酋 msg");
        assert_eq!(verdict.pulls_since_top, 75);
    }

    #[test]
    fn test_evaluate_unlucky_default() {
        let tracker = tracker_with("u1", &["S", "S"]);
        let rules = vec![unlucky(100, "超级非酋")];
        let verdict = tracker.evaluate_unlucky("u1", &rules);
        assert_eq!(verdict.rating, "普通");
        assert_eq!(verdict.message, "运气尚可");
        assert_eq!(verdict.pulls_since_top, 2);

        assert_eq!(tracker.evaluate_unlucky("u1", &[]).rating, "普通");
    }

    #[test]
    fn test_evaluate_unlucky_unsorted_rules_first_match_wins() {
        let mut tracker = HistoryTracker::default();
        for _ in 0..120 {
            tracker.record_pull("u1", "S");
        }
        // Ascending tables pick the loosest rule, not the tightest.
        let rules = vec![unlucky(0, "普通人"), unlucky(100, "超级非酋")];
        assert_eq!(tracker.evaluate_unlucky("u1", &rules).rating, "普通人");
    }

    #[test]
    fn test_evaluate_lucky_per_rule_window() {
        let tracker = tracker_with("u1", &["S", "SSS", "S", "S", "SSS", "SSS"]);
        let rules = vec![
            lucky(3, 3, "超级欧皇"),   // last 3: S, SSS, SSS -> 2
            lucky(3, 6, "欧皇"),       // last 6 -> 3
            lucky(1, 10, "小欧"),
        ];
        let verdict = tracker.evaluate_lucky("u1", &rules);
        assert_eq!(verdict.rating, "欧皇");
        assert_eq!(verdict.top_count, 3);
        assert_eq!(verdict.window, 6);
    }

    #[test]
    fn test_evaluate_lucky_default() {
        let tracker = tracker_with("u1", &["S", "S", "S"]);
        let rules = vec![lucky(1, 10, "小欧")];
        let verdict = tracker.evaluate_lucky("u1", &rules);
        assert_eq!(verdict, LuckyVerdict {
            rating: "普通".to_string(),
            message: "运气普通".to_string(),
            top_count: 0,
            window: 10,
        });
    }

    #[test]
    fn test_clear_history() {
        let mut tracker = tracker_with("u1", &["SSS", "S"]);
        tracker.record_pull("u2", "S");

        assert!(tracker.clear_history("u1"));
        assert_eq!(tracker.total_pulls("u1"), 0);
        assert_eq!(tracker.pulls_since_top_rarity("u1"), 0);
        assert!(tracker.history("u1").is_none());
        assert!(!tracker.clear_history("u1"));

        // Other users are untouched.
        assert_eq!(tracker.total_pulls("u2"), 1);
        assert_eq!(tracker.user_count(), 1);
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rule: LuckyRule = toml::from_str("threshold = 2").unwrap();
        assert_eq!(rule.window, DEFAULT_LUCK_WINDOW);
        assert_eq!(rule.rating, "普通");
        assert!(rule.message.is_empty());

        let rule: UnluckyRule = toml::from_str("rating = \"非酋\"").unwrap();
        assert_eq!(rule.threshold, 0);
    }
}
