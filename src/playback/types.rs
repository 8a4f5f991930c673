//! Playback type definitions
//!
//! This module defines the runtime types shared by the scheduler, the judgment
//! engine and the renderer-facing frame.

use crate::chart::{Note, NoteKind};
use crate::playback::stats::SessionStats;
use serde::Serialize;

/// Which of the two tap actions the player pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    Primary,
    Secondary,
}

impl From<NoteKind> for InputAction {
    fn from(kind: NoteKind) -> Self {
        match kind {
            NoteKind::Primary => InputAction::Primary,
            NoteKind::Secondary => InputAction::Secondary,
        }
    }
}

/// A discrete, edge-detected input from the device collaborator
///
/// `timestamp` is playback time (offset already applied), not device time.
/// `is_new_press` is false for key-repeat and held-key reports, which the
/// judgment engine ignores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub action: InputAction,
    pub timestamp: f64,
    pub is_new_press: bool,
}

impl InputEvent {
    /// A fresh press at `timestamp`
    pub fn press(action: InputAction, timestamp: f64) -> Self {
        Self {
            action,
            timestamp,
            is_new_press: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgmentCategory {
    Perfect,
    Good,
    Bad,
    Miss,
}

impl JudgmentCategory {
    /// Bad and Miss reset the combo
    pub fn breaks_combo(self) -> bool {
        matches!(self, JudgmentCategory::Bad | JudgmentCategory::Miss)
    }
}

/// The result of judging one note
///
/// `time_delta` is `input time - note time` in seconds: negative is early,
/// positive is late.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentOutcome {
    pub category: JudgmentCategory,
    pub time_delta: f64,
    pub note_index: usize,
    pub gogo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "outcome")]
pub enum JudgmentState {
    Pending,
    Resolved(JudgmentOutcome),
    Expired,
}

/// A note inside the spawn horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveNote {
    /// Position in the course's note list
    pub index: usize,
    pub note: Note,
    pub state: JudgmentState,
    /// 0 at spawn, 1 at the judgment point, above 1 once it has passed
    pub progress: f64,
}

impl ActiveNote {
    pub fn is_pending(&self) -> bool {
        self.state == JudgmentState::Pending
    }
}

/// What the renderer needs to draw one note
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub index: usize,
    pub kind: NoteKind,
    pub progress: f64,
    pub scroll: f64,
    pub state: JudgmentState,
}

impl From<&ActiveNote> for NoteView {
    fn from(active: &ActiveNote) -> Self {
        Self {
            index: active.index,
            kind: active.note.kind,
            progress: active.progress,
            scroll: active.note.scroll_at_time,
            state: active.state,
        }
    }
}

/// Everything a renderer consumes for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub playback_time: f64,
    /// Tempo in effect at `playback_time`, `None` before the first tempo event
    pub tempo: Option<f64>,
    /// Whether a gogo section is playing at `playback_time`
    pub gogo: bool,
    pub notes: Vec<NoteView>,
    /// Outcomes produced during this tick, misses first, then inputs in order
    pub outcomes: Vec<JudgmentOutcome>,
    /// Most recent outcome of the session, for transient on-screen feedback
    pub last_outcome: Option<JudgmentOutcome>,
    pub stats: SessionStats,
}
