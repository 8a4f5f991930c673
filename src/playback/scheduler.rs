//! Note scheduling against the playback clock
//!
//! The scheduler owns the runtime state of one course: which notes have entered
//! the spawn horizon, how far along their approach they are, and whether they
//! are still waiting to be judged.
//!
//! ## Lifecycle
//! ```text
//!   unspawned ──(time - lookahead <= t)──> Pending ──(hit)──> removed (Perfect/Good)
//!                                             │      └─(hit)──> Resolved (Bad)
//!                                             └──(t > time + miss)──> Expired (Miss)
//!
//!   Resolved / Expired ──(t > time + miss + decay)──> removed
//! ```
//!
//! Times only move forward. Advancing to an earlier time is rejected with
//! [`TjaError::ClockRewound`] and leaves the scheduler untouched.

use crate::chart::{CourseChart, Note, DEFAULT_BPM};
use crate::config::EngineConfig;
use crate::error::TjaError;
use crate::playback::types::{ActiveNote, JudgmentCategory, JudgmentOutcome, JudgmentState};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NoteScheduler {
    course: Arc<CourseChart>,
    lookahead_beats: f64,
    miss_window: f64,
    decay_seconds: f64,
    /// Per note, whether it has entered the active set
    spawned: Vec<bool>,
    spawned_count: usize,
    /// Every note before this index has spawned
    first_unspawned: usize,
    /// Longest lookahead of any note in the course
    max_lookahead: f64,
    /// Ordered by note index
    active: Vec<ActiveNote>,
    playback_time: Option<f64>,
}

impl NoteScheduler {
    pub fn new(course: Arc<CourseChart>, config: &EngineConfig) -> Self {
        let max_lookahead = course
            .notes
            .iter()
            .map(|note| lookahead_seconds(config.lookahead_beats, note))
            .fold(0.0, f64::max);
        Self {
            spawned: vec![false; course.notes.len()],
            spawned_count: 0,
            first_unspawned: 0,
            max_lookahead,
            course,
            lookahead_beats: config.lookahead_beats,
            miss_window: config.miss_window,
            decay_seconds: config.decay_seconds,
            active: Vec::new(),
            playback_time: None,
        }
    }

    /// Seconds between a note's spawn and its arrival at the judgment point
    pub fn lookahead_seconds(&self, note: &Note) -> f64 {
        lookahead_seconds(self.lookahead_beats, note)
    }

    /// Move playback to `playback_time`, returning a Miss for every note whose
    /// window closed
    pub fn advance(&mut self, playback_time: f64) -> Result<Vec<JudgmentOutcome>, TjaError> {
        let previous = self.playback_time.unwrap_or(f64::NEG_INFINITY);
        if !playback_time.is_finite() || playback_time < previous {
            return Err(TjaError::ClockRewound {
                previous,
                now: playback_time,
            });
        }
        self.playback_time = Some(playback_time);

        self.activate(playback_time);
        let misses = self.expire(playback_time);

        for active in &mut self.active {
            let lookahead = lookahead_seconds(self.lookahead_beats, &active.note);
            let spawn_time = active.note.time - lookahead;
            active.progress = ((playback_time - spawn_time) / lookahead).max(0.0);
        }

        let linger = self.miss_window + self.decay_seconds;
        self.active
            .retain(|active| active.is_pending() || playback_time <= active.note.time + linger);

        Ok(misses)
    }

    fn activate(&mut self, playback_time: f64) {
        let course = Arc::clone(&self.course);
        // Notes are sorted by time, so none past the longest lookahead can be due
        let horizon = playback_time + self.max_lookahead;
        for (index, note) in course.notes.iter().enumerate().skip(self.first_unspawned) {
            if note.time > horizon {
                break;
            }
            if self.spawned[index] || note.time - self.lookahead_seconds(note) > playback_time {
                continue;
            }
            log::debug!("Spawning note {} (t={:.3}s) at {:.3}s", index, note.time, playback_time);
            self.spawned[index] = true;
            self.spawned_count += 1;
            let at = self.active.partition_point(|a| a.index < index);
            self.active.insert(
                at,
                ActiveNote {
                    index,
                    note: *note,
                    state: JudgmentState::Pending,
                    progress: 0.0,
                },
            );
        }
        while self.spawned.get(self.first_unspawned).copied().unwrap_or(false) {
            self.first_unspawned += 1;
        }
    }

    fn expire(&mut self, playback_time: f64) -> Vec<JudgmentOutcome> {
        let mut misses = Vec::new();
        for active in self.active.iter_mut() {
            if active.is_pending() && playback_time > active.note.time + self.miss_window {
                log::debug!("Note {} expired unhit", active.index);
                active.state = JudgmentState::Expired;
                misses.push(JudgmentOutcome {
                    category: JudgmentCategory::Miss,
                    time_delta: playback_time - active.note.time,
                    note_index: active.index,
                    gogo: active.note.is_gogo_at_time,
                });
            }
        }
        misses
    }

    /// Notes inside the spawn horizon, ordered by note index
    pub fn active_notes(&self) -> &[ActiveNote] {
        &self.active
    }

    /// Active notes still waiting for a judgment
    pub fn pending_count(&self) -> usize {
        self.active.iter().filter(|a| a.is_pending()).count()
    }

    /// Every note has spawned and left the active set
    pub fn is_finished(&self) -> bool {
        self.spawned_count == self.course.notes.len() && self.active.is_empty()
    }

    /// The last time passed to [`advance`](Self::advance)
    pub fn playback_time(&self) -> Option<f64> {
        self.playback_time
    }

    pub fn course(&self) -> &CourseChart {
        &self.course
    }

    /// Whether a note that already spawned lies within `window` of `timestamp`
    pub(crate) fn spawned_note_near(&self, timestamp: f64, window: f64) -> bool {
        let notes = &self.course.notes;
        let start = notes.partition_point(|n| n.time < timestamp - window);
        (start..notes.len())
            .take_while(|&i| notes[i].time <= timestamp + window)
            .any(|i| self.spawned[i])
    }

    /// Take a judged note out of the active set
    pub(crate) fn remove(&mut self, note_index: usize) {
        self.active.retain(|a| a.index != note_index);
    }

    /// Keep a judged note on screen without letting it be judged again
    pub(crate) fn mark_resolved(&mut self, note_index: usize, outcome: JudgmentOutcome) {
        if let Some(active) = self.active.iter_mut().find(|a| a.index == note_index) {
            active.state = JudgmentState::Resolved(outcome);
        }
    }
}

fn lookahead_seconds(lookahead_beats: f64, note: &Note) -> f64 {
    let bpm = if note.tempo_at_time.is_finite() && note.tempo_at_time > 0.0 {
        note.tempo_at_time
    } else {
        DEFAULT_BPM
    };
    lookahead_beats * 60.0 / bpm
}
