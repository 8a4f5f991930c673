//! # Public API
//!
//! This module contains the main entry points for the TJA engine.
//!
//! ## Functions
//!
//! - [`compile()`](crate::compile) - Compile chart text into a [`Chart`] (never fails)
//! - [`compile_with_diagnostics()`](crate::compile_with_diagnostics) - Same, plus what was skipped
//! - [`load_chart()`] - Read and compile a chart file
//! - [`select_course()`] - Pick a playable course out of a chart
//! - [`start_session()`] - Build a [`Session`] for one course
//!
//! ## Typical Usage
//!
//! ```rust
//! use tja::{compile, start_session, EngineConfig, ManualClock};
//!
//! let source = "TITLE:Demo\nBPM:120\nCOURSE:Oni\n#START\n1020,\n#END\n";
//! let chart = compile(source);
//!
//! let mut session = start_session(&chart, "oni", &EngineConfig::default(), ManualClock::new(0.0))?;
//! let frame = session.tick(&[])?;
//! assert_eq!(frame.notes.len(), 2);
//! # Ok::<(), tja::TjaError>(())
//! ```

use crate::chart::{Chart, CourseChart};
use crate::compiler::{compile_with_diagnostics, Compilation};
use crate::config::EngineConfig;
use crate::error::TjaError;
use crate::playback::{PlaybackClock, Session};
use std::path::Path;
use std::sync::Arc;

/// Look up a course and check that it can be played.
///
/// Any accepted spelling of the course name works (`"3"`, `"oni"`, `"Oni"`).
///
/// # Errors
/// - [`TjaError::NoPlayableCourse`] if the chart has no such course
/// - [`TjaError::EmptyCourse`] if the course has no notes
pub fn select_course(chart: &Chart, name: &str) -> Result<Arc<CourseChart>, TjaError> {
    let course = chart.course(name).ok_or_else(|| TjaError::NoPlayableCourse {
        course: name.to_string(),
    })?;
    if course.notes.is_empty() {
        return Err(TjaError::EmptyCourse {
            course: name.to_string(),
        });
    }
    Ok(Arc::new(course.clone()))
}

/// Start a play session on one course of a compiled chart.
///
/// # Example
/// ```rust
/// use tja::{compile, start_session, EngineConfig};
///
/// let chart = compile("BPM:150\nCOURSE:Hard\n#START\n1111,\n#END\n");
/// let session = start_session(&chart, "2", &EngineConfig::default(), || 0.0)?;
/// assert_eq!(session.scheduler().course().notes.len(), 4);
/// # Ok::<(), tja::TjaError>(())
/// ```
pub fn start_session<C: PlaybackClock>(
    chart: &Chart,
    course: &str,
    config: &EngineConfig,
    clock: C,
) -> Result<Session<C>, TjaError> {
    config.validate()?;
    let course_chart = select_course(chart, course)?;
    log::debug!("Starting {} ({} notes)", course, course_chart.notes.len());
    Ok(Session::new(course_chart, config, clock))
}

/// Read a chart file and compile it.
///
/// Charts are expected to be UTF-8; invalid sequences are replaced rather than
/// rejected so a stray byte in a title does not lose the whole chart.
///
/// # Errors
/// Returns [`TjaError::Io`] if the file cannot be read.
pub fn load_chart(path: impl AsRef<Path>) -> Result<Compilation, TjaError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| TjaError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let source = String::from_utf8_lossy(&bytes);
    Ok(compile_with_diagnostics(&source))
}
