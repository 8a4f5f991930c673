//! Input judgment
//!
//! Matches one edge-detected press against the nearest pending note and
//! classifies the timing error.
//!
//! ## Windows
//! With the default windows, the absolute error `|input - note|` maps to:
//! ```text
//!   0.000 ..= 0.067  Perfect   +100, combo + 1, note removed
//!   0.067 ..= 0.133  Good      +50,  combo + 1, note removed
//!   0.133 ..= 0.217  Bad       combo reset, note kept on screen until it decays
//!   beyond 0.217     nothing   combo reset, no Miss recorded
//! ```
//! Boundaries are inclusive on the tighter side. A press that only lands near
//! a note judged earlier changes nothing. A note nobody hits becomes a Miss in
//! the scheduler once its miss window closes.

use crate::config::{EngineConfig, JudgmentWindows};
use crate::playback::scheduler::NoteScheduler;
use crate::playback::stats::SessionStats;
use crate::playback::types::{InputEvent, JudgmentCategory, JudgmentOutcome};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentEngine {
    windows: JudgmentWindows,
}

impl JudgmentEngine {
    pub fn new(windows: JudgmentWindows) -> Self {
        Self { windows }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.windows)
    }

    pub fn windows(&self) -> &JudgmentWindows {
        &self.windows
    }

    /// Category for a signed timing error, or `None` outside the Bad window
    pub fn classify(&self, time_delta: f64) -> Option<JudgmentCategory> {
        let error = time_delta.abs();
        if error <= self.windows.perfect {
            Some(JudgmentCategory::Perfect)
        } else if error <= self.windows.good {
            Some(JudgmentCategory::Good)
        } else if error <= self.windows.bad {
            Some(JudgmentCategory::Bad)
        } else {
            None
        }
    }

    /// Judge one input, updating the scheduler's note state and the stats
    ///
    /// Returns `None` for repeats of a held key and for presses landing on a
    /// note that was already judged; neither changes anything. A press that
    /// matches no note at all also returns `None` and breaks the combo.
    pub fn judge(
        &self,
        scheduler: &mut NoteScheduler,
        stats: &mut SessionStats,
        input: InputEvent,
    ) -> Option<JudgmentOutcome> {
        if !input.is_new_press {
            return None;
        }

        // Strict comparison keeps the earlier note on equal distance
        let mut nearest: Option<(f64, usize)> = None;
        for active in scheduler.active_notes().iter().filter(|a| a.is_pending()) {
            let distance = (active.note.time - input.timestamp).abs();
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, active.index));
            }
        }

        let target = nearest.and_then(|(_, index)| {
            let active = scheduler.active_notes().iter().find(|a| a.index == index)?;
            let time_delta = input.timestamp - active.note.time;
            let category = self.classify(time_delta)?;
            Some(JudgmentOutcome {
                category,
                time_delta,
                note_index: index,
                gogo: active.note.is_gogo_at_time,
            })
        });

        let Some(outcome) = target else {
            if scheduler.spawned_note_near(input.timestamp, self.windows.bad) {
                // Repeat press on a note that was already judged
                log::debug!("Press at {:.3}s hit an already judged note", input.timestamp);
            } else {
                log::debug!("Press at {:.3}s matched no note", input.timestamp);
                stats.break_combo();
            }
            return None;
        };

        match outcome.category {
            JudgmentCategory::Perfect | JudgmentCategory::Good => scheduler.remove(outcome.note_index),
            _ => scheduler.mark_resolved(outcome.note_index, outcome),
        }
        stats.record(&outcome);
        Some(outcome)
    }
}

impl Default for JudgmentEngine {
    fn default() -> Self {
        Self::new(JudgmentWindows::default())
    }
}
