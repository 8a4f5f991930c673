//! # Playback Module
//!
//! Drive real-time play of a compiled course: spawn notes ahead of the audio,
//! position them for rendering, and judge player presses against them.
//!
//! ## Purpose
//! The compiler produces an immutable timeline. This module reconciles that
//! timeline with an external playback clock:
//! 1. **Scheduling** - notes enter the active set a fixed number of beats early
//! 2. **Judgment** - each new press is matched to the nearest pending note
//! 3. **Scoring** - outcomes feed score, combo and accuracy
//!
//! ## Sub-modules
//! - `types` - InputEvent, JudgmentOutcome, ActiveNote, Frame
//! - `clock` - The PlaybackClock trait and two clocks
//! - `scheduler` - NoteScheduler (activation, progress, expiry)
//! - `judgment` - JudgmentEngine (window classification)
//! - `stats` - SessionStats (score, combo, accuracy)
//! - `session` - Session, the per-frame tick loop
//!
//! ## Example
//! ```rust
//! use tja::playback::{InputAction, InputEvent, JudgmentCategory, Session};
//! use tja::{compile, select_course, EngineConfig, ManualClock};
//!
//! let chart = compile("BPM:120\nCOURSE:Oni\n#START\n1000,\n#END\n");
//! let course = select_course(&chart, "Oni").unwrap();
//! let mut session = Session::new(course, &EngineConfig::default(), ManualClock::new(0.0));
//!
//! session.tick(&[]).unwrap();
//! session.clock().set(0.02);
//! let frame = session.tick(&[InputEvent::press(InputAction::Primary, 0.02)]).unwrap();
//!
//! assert_eq!(frame.outcomes[0].category, JudgmentCategory::Perfect);
//! assert_eq!(frame.stats.score, 100);
//! ```
//!
//! ## Timing Model
//! All times are playback seconds with the chart offset already applied, so a
//! note at `time = 2.0` should be hit when the clock reads 2.0. A note spawns
//! at `time - lookahead_beats * 60 / tempo_at_time` and its `progress` runs
//! from 0 at spawn to 1 at the judgment point.

pub mod clock;
pub mod judgment;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;

pub use clock::{InstantClock, ManualClock, PlaybackClock};
pub use judgment::JudgmentEngine;
pub use scheduler::NoteScheduler;
pub use session::Session;
pub use stats::SessionStats;
pub use types::*;
