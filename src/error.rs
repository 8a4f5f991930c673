//! # Error Types
//!
//! This module defines the error type for the TJA engine.
//!
//! Chart compilation itself never fails: malformed directives and rows are skipped
//! and reported as [`Diagnostic`](crate::Diagnostic)s. Errors are reserved for
//! integration faults the host has to decide about.
//!
//! ## Error Types
//! - `NoPlayableCourse` - The requested course is not in the chart
//! - `EmptyCourse` - The course exists but has no notes to play
//! - `ClockRewound` - Playback time went backwards; rebuild the session
//! - `Config` - Invalid engine configuration
//! - `Io` - A chart or config file could not be read
//!
//! ## Usage
//! ```rust
//! use tja::{compile, start_session, EngineConfig, ManualClock, TjaError};
//!
//! let chart = compile("BPM:120\nCOURSE:Oni\n1000,\n");
//! match start_session(&chart, "Easy", &EngineConfig::default(), ManualClock::new(0.0)) {
//!     Ok(_) => println!("ready"),
//!     Err(TjaError::NoPlayableCourse { course }) => eprintln!("no course named {}", course),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TjaError {
    /// The requested course does not exist in the chart.
    ///
    /// # Example
    /// ```
    /// # use tja::TjaError;
    /// let err = TjaError::NoPlayableCourse { course: "Hard".to_string() };
    /// assert_eq!(err.to_string(), "No playable course: Hard");
    /// ```
    #[error("No playable course: {course}")]
    NoPlayableCourse { course: String },

    /// The course exists but compiled to zero notes.
    #[error("Course {course} has no notes")]
    EmptyCourse { course: String },

    /// The playback clock reported a time earlier than the last advanced time.
    ///
    /// # Example
    /// ```
    /// # use tja::TjaError;
    /// let err = TjaError::ClockRewound { previous: 2.5, now: 1.0 };
    /// assert_eq!(err.to_string(), "Playback clock went backwards from 2.5s to 1s");
    /// ```
    #[error("Playback clock went backwards from {previous}s to {now}s")]
    ClockRewound { previous: f64, now: f64 },

    /// Invalid engine configuration (bad YAML or inconsistent windows).
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Could not read '{path}': {message}")]
    Io { path: String, message: String },
}
