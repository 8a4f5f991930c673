//! # tja
//!
//! A compiler for TJA rhythm-game charts and the playback core that schedules
//! and judges notes against an external audio clock.
//!
//! ## Pipeline
//! ```text
//! chart text ──lexer──> lines ──compiler──> Chart ──select_course──> Arc<CourseChart>
//!                                                                        │
//!                      clock ──> Session::tick(inputs) ──> Frame <───────┘
//! ```
//!
//! Compilation is tolerant: malformed lines are skipped and reported as
//! [`Diagnostic`]s, so [`compile`] always returns a chart. Playback is
//! single-threaded and driven entirely by the host calling [`Session::tick`].

pub mod api;
pub mod chart;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod playback;

pub use api::{load_chart, select_course, start_session};
pub use chart::*;
pub use compiler::{compile, compile_with_diagnostics, Compilation, Compiler, Diagnostic};
pub use config::{EngineConfig, JudgmentWindows, ScoreTable};
pub use error::*;
pub use playback::{
    Frame, InputAction, InputEvent, InstantClock, JudgmentCategory, JudgmentOutcome, ManualClock,
    PlaybackClock, Session, SessionStats,
};
