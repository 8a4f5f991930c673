//! Running score, combo and accuracy for a session

use crate::config::ScoreTable;
use crate::playback::types::{JudgmentCategory, JudgmentOutcome};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
    #[serde(skip)]
    scoring: ScoreTable,
}

impl SessionStats {
    pub fn new(scoring: ScoreTable) -> Self {
        Self {
            scoring,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &JudgmentOutcome) {
        match outcome.category {
            JudgmentCategory::Perfect => self.perfect += 1,
            JudgmentCategory::Good => self.good += 1,
            JudgmentCategory::Bad => self.bad += 1,
            JudgmentCategory::Miss => self.miss += 1,
        }

        if outcome.category.breaks_combo() {
            self.combo = 0;
            return;
        }

        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);

        let base = match outcome.category {
            JudgmentCategory::Perfect => self.scoring.perfect,
            _ => self.scoring.good,
        };
        let points = if outcome.gogo {
            (base as f64 * self.scoring.gogo_multiplier).round() as u64
        } else {
            base
        };
        self.score = self.score.saturating_add(points);
    }

    /// An input that matched nothing
    pub fn break_combo(&mut self) {
        self.combo = 0;
    }

    pub fn total_resolved(&self) -> u32 {
        self.perfect + self.good + self.bad + self.miss
    }

    /// Percentage of resolved notes hit Perfect or Good; 0 before anything resolves
    pub fn accuracy(&self) -> f64 {
        let total = self.total_resolved();
        if total == 0 {
            return 0.0;
        }
        (self.perfect + self.good) as f64 / total as f64 * 100.0
    }
}
