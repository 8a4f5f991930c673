//! # Chart Types
//!
//! This module defines the compiled, immutable form of a TJA chart.
//!
//! ## Type Hierarchy
//! ```text
//! Chart
//!   ├── title, subtitle, wave, demo_start
//!   ├── initial_bpm, offset
//!   └── BTreeMap<course name, CourseChart>
//!         ├── level, balloons
//!         ├── Vec<Note> (sorted by time, stable by parse order)
//!         ├── tempo / measure / scroll / gogo / barline events
//!         └── Vec<Barline> (one per measure)
//!
//! Note
//!   ├── time (seconds, offset applied)
//!   ├── kind: Primary | Secondary
//!   └── tempo / scroll / measure / gogo in effect at that time
//! ```
//!
//! ## Key Concepts
//!
//! ### Times
//! All times are absolute seconds from the start of the course, after the chart
//! `OFFSET` has been applied (`time = chart_time - offset`). Note times are always
//! finite and non-negative; event times may be negative for a positive offset.
//!
//! ### Event Sequences
//! Each kind of timeline event is kept in its own sequence because playback reads
//! them independently (scroll speed, bar lines, gogo state, tempo lookups).
//!
//! ### Course Names
//! Numeric and lower-case course names are canonicalised with [`canonical_course_name`],
//! so `COURSE:3` and `COURSE:oni` both compile into `"Oni"`.

use serde::Serialize;
use std::collections::BTreeMap;

/// Tempo used when a chart has no valid `BPM` header.
pub const DEFAULT_BPM: f64 = 120.0;

/// Quarter notes per measure when no `MEASURE` directive is in effect (4/4).
pub const DEFAULT_MEASURE_LENGTH: f64 = 4.0;

/// Course that rows belong to when no `COURSE` directive precedes them.
pub const DEFAULT_COURSE: &str = "Oni";

/// The two tap types a player can hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Primary,
    Secondary,
}

impl NoteKind {
    /// Map a single row character to a tap note.
    ///
    /// Returns `None` for empty slots, roll ends, balloon markers and unknown codes.
    ///
    /// # Example
    /// ```
    /// use tja::NoteKind;
    ///
    /// assert_eq!(NoteKind::from_code('1'), Some(NoteKind::Primary));
    /// assert_eq!(NoteKind::from_code('4'), Some(NoteKind::Secondary));
    /// assert_eq!(NoteKind::from_code('5'), None);
    /// ```
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '1' | '3' | '6' => Some(NoteKind::Primary),
            '2' | '4' => Some(NoteKind::Secondary),
            _ => None,
        }
    }
}

/// A single tap note with the timeline context it was compiled in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub time: f64,
    pub kind: NoteKind,
    pub tempo_at_time: f64,
    pub scroll_at_time: f64,
    pub measure_at_time: f64,
    pub is_gogo_at_time: bool,
}

/// What a timeline event changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum EventKind {
    /// New tempo in beats per minute
    Tempo(f64),
    /// Measure length in quarter notes (4/4 = 4.0, 3/4 = 3.0)
    Measure(f64),
    /// Scroll speed multiplier
    Scroll(f64),
    /// Gogo section on/off
    Gogo(bool),
    /// Bar line visibility
    Barline(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub time: f64,
    pub kind: EventKind,
}

/// Start of a measure, for bar-line rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Barline {
    pub time: f64,
    pub visible: bool,
}

/// One difficulty's full note chart
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChart {
    pub level: u32,
    pub balloons: Vec<u32>,
    pub notes: Vec<Note>,
    pub tempo_events: Vec<TimelineEvent>,
    pub measure_events: Vec<TimelineEvent>,
    pub scroll_events: Vec<TimelineEvent>,
    pub gogo_events: Vec<TimelineEvent>,
    pub barline_events: Vec<TimelineEvent>,
    pub bars: Vec<Barline>,
}

impl CourseChart {
    /// Time of the last note, or 0.0 for an empty course.
    pub fn last_note_time(&self) -> f64 {
        self.notes.last().map(|n| n.time).unwrap_or(0.0)
    }

    /// Tempo in effect at `time`, from the tempo event sequence.
    pub fn tempo_at(&self, time: f64) -> Option<f64> {
        self.tempo_events
            .iter()
            .take_while(|e| e.time <= time)
            .filter_map(|e| match e.kind {
                EventKind::Tempo(bpm) => Some(bpm),
                _ => None,
            })
            .last()
    }

    /// Whether a gogo section is active at `time`.
    pub fn is_gogo_at(&self, time: f64) -> bool {
        self.gogo_events
            .iter()
            .take_while(|e| e.time <= time)
            .filter_map(|e| match e.kind {
                EventKind::Gogo(on) => Some(on),
                _ => None,
            })
            .last()
            .unwrap_or(false)
    }
}

/// A compiled chart: song metadata plus one `CourseChart` per difficulty
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub title: String,
    pub subtitle: String,
    pub wave: Option<String>,
    pub initial_bpm: f64,
    pub offset: f64,
    pub demo_start: f64,
    pub courses: BTreeMap<String, CourseChart>,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            wave: None,
            initial_bpm: DEFAULT_BPM,
            offset: 0.0,
            demo_start: 0.0,
            courses: BTreeMap::new(),
        }
    }
}

impl Chart {
    /// Look up a course by any accepted spelling of its name.
    pub fn course(&self, name: &str) -> Option<&CourseChart> {
        self.courses.get(&canonical_course_name(name))
    }
}

/// Canonicalise a `COURSE` value.
///
/// Numeric ids and the standard names (any case) map to `Easy`, `Normal`, `Hard`,
/// `Oni` and `Edit` (`Ura` is an alias of `Edit`). Anything else is kept as written.
///
/// # Example
/// ```
/// use tja::canonical_course_name;
///
/// assert_eq!(canonical_course_name("3"), "Oni");
/// assert_eq!(canonical_course_name("hard"), "Hard");
/// assert_eq!(canonical_course_name("Ura"), "Edit");
/// assert_eq!(canonical_course_name("Tower"), "Tower");
/// ```
pub fn canonical_course_name(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "0" | "easy" => "Easy".to_string(),
        "1" | "normal" => "Normal".to_string(),
        "2" | "hard" => "Hard".to_string(),
        "3" | "oni" => "Oni".to_string(),
        "4" | "edit" | "ura" => "Edit".to_string(),
        _ => trimmed.to_string(),
    }
}
