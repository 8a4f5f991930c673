//! # Chart Compiler
//!
//! Turns TJA source text into a [`Chart`].
//!
//! ## Pipeline
//! 1. The [`Lexer`] classifies each line as a directive, a note row or noise
//! 2. The [`Compiler`] walks the lines with a running timeline state
//!    (tempo, scroll, measure length, gogo, bar-line visibility, cursor time)
//! 3. Each comma closes a measure: its slots are timed and its notes emitted
//! 4. `COURSE` and end of input flush the course (offset, sort, attach events)
//!
//! ## Tolerance
//! Compilation never fails. Directives with invalid operands are skipped and the
//! last valid value stays in effect; every skip is logged and recorded as a
//! [`Diagnostic`]. Unknown directives are ignored.
//!
//! ## Measure Timing
//! A measure of `N` slots at tempo `B` with length `L` quarter notes lasts
//! `(60 / B) * L` seconds and slot `i` sits at `start + i * (60 / B) * (L / N)`.
//! Directives inside a multi-line measure take effect at the slot where they
//! appear, so a mid-measure `BPMCHANGE` re-times the remaining slots.
//!
//! ## Example
//! ```rust
//! use tja::{compile, NoteKind};
//!
//! let chart = compile("TITLE:Demo\nBPM:120\nCOURSE:Oni\n1020,\n,\n");
//! let oni = chart.course("Oni").unwrap();
//!
//! assert_eq!(oni.notes.len(), 2);
//! assert_eq!(oni.notes[0].kind, NoteKind::Primary);
//! assert_eq!(oni.notes[1].time, 1.0);
//! assert_eq!(oni.bars[1].time, 2.0);
//! ```

use crate::chart::*;
use crate::lexer::{Lexer, LineKind, LocatedLine};
use log::{debug, warn};
use serde::Serialize;

/// A skipped directive, row or note, with the source line it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

/// Result of compiling with diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    pub chart: Chart,
    pub diagnostics: Vec<Diagnostic>,
}

/// Timeline commands that take effect at a position in a measure
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    BpmChange(f64),
    Measure(f64),
    Scroll(f64),
    Gogo(bool),
    Barline(bool),
    Delay(f64),
}

/// Contents of a measure that has not seen its closing comma yet
#[derive(Debug, Clone, PartialEq)]
enum MeasureItem {
    Codes { codes: String, line: usize },
    Command(Command),
}

/// Running state that timeline commands change
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimelineState {
    bpm: f64,
    scroll: f64,
    measure_length: f64,
    gogo: bool,
    barline_visible: bool,
}

impl TimelineState {
    fn from_header(bpm: f64) -> Self {
        Self {
            bpm,
            scroll: 1.0,
            measure_length: DEFAULT_MEASURE_LENGTH,
            gogo: false,
            barline_visible: true,
        }
    }
}

/// A course being compiled; times are pre-offset
struct CourseBuilder {
    name: String,
    explicit: bool, // declared with COURSE rather than implied by content
    measures: usize,
    chart: CourseChart,
}

/// Compiler for TJA source
pub struct Compiler {
    chart: Chart,
    diagnostics: Vec<Diagnostic>,
    state: TimelineState,
    cursor: f64,
    course: Option<CourseBuilder>,
    pending: Vec<MeasureItem>,
    carried: Option<(u32, Vec<u32>)>, // metadata set before the first COURSE
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            chart: Chart::default(),
            diagnostics: Vec::new(),
            state: TimelineState::from_header(DEFAULT_BPM),
            cursor: 0.0,
            course: None,
            pending: Vec::new(),
            carried: None,
        }
    }

    /// Compile a whole source text
    pub fn compile(mut self, source: &str) -> Compilation {
        let lines = Lexer::new(source).tokenize();
        for line in lines {
            self.process_line(line);
        }
        self.flush_course();

        Compilation {
            chart: self.chart,
            diagnostics: self.diagnostics,
        }
    }

    fn process_line(&mut self, line: LocatedLine) {
        match line.kind {
            LineKind::Directive { key, value } => self.directive(line.line, &key, &value),
            LineKind::NoteRow { codes, terminated, measure_override } => {
                self.ensure_course();
                if !codes.is_empty() {
                    self.pending.push(MeasureItem::Codes { codes, line: line.line });
                }
                if terminated {
                    let length = measure_override.and_then(|text| self.parse_override(line.line, &text));
                    self.flush_measure(length);
                }
            }
            LineKind::Unrecognized(text) => {
                self.skip(line.line, format!("Unrecognized line '{}'", text));
            }
        }
    }

    fn directive(&mut self, line: usize, key: &str, value: &str) {
        match key {
            "TITLE" => self.chart.title = value.to_string(),
            "SUBTITLE" => {
                let subtitle = value
                    .strip_prefix("--")
                    .or_else(|| value.strip_prefix("++"))
                    .unwrap_or(value);
                self.chart.subtitle = subtitle.trim().to_string();
            }
            "WAVE" => {
                if !value.is_empty() {
                    self.chart.wave = Some(value.to_string());
                }
            }
            "BPM" => {
                if let Some(bpm) = self.parse_positive(line, key, value) {
                    self.chart.initial_bpm = bpm;
                    self.reseed_tempo(bpm);
                }
            }
            "OFFSET" => {
                if let Some(offset) = self.parse_finite(line, key, value) {
                    self.chart.offset = offset;
                }
            }
            "DEMOSTART" => {
                if let Some(start) = self.parse_finite(line, key, value) {
                    self.chart.demo_start = start.max(0.0);
                }
            }
            "COURSE" => {
                if value.is_empty() {
                    self.skip(line, "COURSE without a name".to_string());
                    return;
                }
                self.flush_course();
                self.begin_course(canonical_course_name(value), true);
            }
            "LEVEL" => match value.parse::<u32>() {
                Ok(level) => match self.course.as_mut() {
                    Some(course) => course.chart.level = level,
                    None => self.carried.get_or_insert_with(Default::default).0 = level,
                },
                Err(_) => self.skip(line, format!("Invalid LEVEL '{}'", value)),
            },
            "BALLOON" => {
                let balloons = self.parse_balloons(line, value);
                match self.course.as_mut() {
                    Some(course) => course.chart.balloons = balloons,
                    None => self.carried.get_or_insert_with(Default::default).1 = balloons,
                }
            }
            "BPMCHANGE" => {
                if let Some(bpm) = self.parse_positive(line, key, value) {
                    self.queue(Command::BpmChange(bpm));
                }
            }
            "MEASURE" => match parse_measure(value) {
                Some(length) => self.queue(Command::Measure(length)),
                None => self.skip(line, format!("Invalid MEASURE '{}'", value)),
            },
            "SCROLL" => {
                if let Some(scroll) = self.parse_finite(line, key, value) {
                    self.queue(Command::Scroll(scroll));
                }
            }
            "GOGOSTART" => self.queue(Command::Gogo(true)),
            "GOGOEND" => self.queue(Command::Gogo(false)),
            "BARLINEON" => self.queue(Command::Barline(true)),
            "BARLINEOFF" => self.queue(Command::Barline(false)),
            "DELAY" => match value.trim().parse::<f64>() {
                Ok(delay) if delay.is_finite() && delay >= 0.0 => self.queue(Command::Delay(delay)),
                _ => self.skip(line, format!("Invalid DELAY '{}'", value)),
            },
            "START" => self.ensure_course(),
            "END" => self.flush_directives(),
            _ => debug!("line {}: ignoring directive {}", line, key),
        }
    }

    /// Start a course from the header defaults, never from the previous course
    fn begin_course(&mut self, name: String, explicit: bool) {
        let course = self.new_course(name, explicit);
        self.course = Some(course);
    }

    fn new_course(&mut self, name: String, explicit: bool) -> CourseBuilder {
        self.state = TimelineState::from_header(self.chart.initial_bpm);
        self.cursor = 0.0;

        let mut chart = CourseChart::default();
        if let Some((level, balloons)) = self.carried.take() {
            chart.level = level;
            chart.balloons = balloons;
        }
        chart.tempo_events.push(TimelineEvent {
            time: 0.0,
            kind: EventKind::Tempo(self.state.bpm),
        });

        CourseBuilder {
            name,
            explicit,
            measures: 0,
            chart,
        }
    }

    fn ensure_course(&mut self) {
        self.course_mut();
    }

    fn course_mut(&mut self) -> &mut CourseBuilder {
        let course = match self.course.take() {
            Some(course) => course,
            None => self.new_course(DEFAULT_COURSE.to_string(), false),
        };
        self.course.insert(course)
    }

    /// A header BPM also retimes a course that has not timed any measure yet
    fn reseed_tempo(&mut self, bpm: f64) {
        let has_codes = self.pending.iter().any(|item| matches!(item, MeasureItem::Codes { .. }));
        let Some(course) = self.course.as_mut() else {
            return;
        };
        if course.measures > 0 || has_codes {
            return;
        }
        self.state.bpm = bpm;
        if let Some(seed) = course.chart.tempo_events.first_mut() {
            seed.kind = EventKind::Tempo(bpm);
        }
    }

    fn queue(&mut self, command: Command) {
        self.ensure_course();
        self.pending.push(MeasureItem::Command(command));
    }

    /// Apply a command at `time` and record its event
    fn apply(&mut self, command: Command, time: f64) {
        let Some(course) = self.course.as_mut() else {
            return;
        };
        let chart = &mut course.chart;
        match command {
            Command::BpmChange(bpm) => {
                self.state.bpm = bpm;
                chart.tempo_events.push(TimelineEvent { time, kind: EventKind::Tempo(bpm) });
            }
            Command::Measure(length) => {
                self.state.measure_length = length;
                chart.measure_events.push(TimelineEvent { time, kind: EventKind::Measure(length) });
            }
            Command::Scroll(scroll) => {
                self.state.scroll = scroll;
                chart.scroll_events.push(TimelineEvent { time, kind: EventKind::Scroll(scroll) });
            }
            Command::Gogo(on) => {
                self.state.gogo = on;
                chart.gogo_events.push(TimelineEvent { time, kind: EventKind::Gogo(on) });
            }
            Command::Barline(visible) => {
                self.state.barline_visible = visible;
                chart.barline_events.push(TimelineEvent { time, kind: EventKind::Barline(visible) });
            }
            // Delays move the cursor; callers handle them
            Command::Delay(_) => {}
        }
    }

    /// Apply queued commands of a measure that never got its comma
    fn flush_directives(&mut self) {
        for item in std::mem::take(&mut self.pending) {
            match item {
                MeasureItem::Command(Command::Delay(delay)) => self.cursor += delay,
                MeasureItem::Command(command) => self.apply(command, self.cursor),
                MeasureItem::Codes { line, .. } => {
                    self.skip(line, "Note row without a closing comma".to_string());
                }
            }
        }
    }

    /// Close the current measure: time its slots, emit notes, advance the cursor
    fn flush_measure(&mut self, length_override: Option<f64>) {
        let items = std::mem::take(&mut self.pending);
        let total: usize = items
            .iter()
            .map(|item| match item {
                MeasureItem::Codes { codes, .. } => codes.chars().count(),
                MeasureItem::Command(_) => 0,
            })
            .sum();
        let mut items = items.into_iter().peekable();

        // Commands before the first code act at the start of the measure
        while let Some(MeasureItem::Command(command)) = items.next_if(|i| matches!(i, MeasureItem::Command(_))) {
            match command {
                Command::Delay(delay) => self.cursor += delay,
                command => self.apply(command, self.cursor),
            }
        }

        let length = length_override.unwrap_or(self.state.measure_length);
        if !(self.state.bpm.is_finite() && self.state.bpm > 0.0) {
            warn!("skipping measure at {:.3}s: tempo {} is not usable", self.cursor, self.state.bpm);
            return;
        }

        let visible = self.state.barline_visible;
        let Some(course) = self.course.as_mut() else {
            return;
        };
        course.measures += 1;
        course.chart.bars.push(Barline { time: self.cursor, visible });

        let mut beat_seconds = 60.0 / self.state.bpm;
        if total == 0 {
            self.cursor += beat_seconds * length;
            return;
        }

        let mut segment_start = self.cursor;
        let mut consumed = 0usize; // slots before the current tempo segment
        let mut local = 0usize; // slots into the current tempo segment

        for item in items {
            match item {
                MeasureItem::Codes { codes, line } => {
                    let slot = beat_seconds * (length / total as f64);
                    let mut unknown = None;
                    for code in codes.chars() {
                        let time = segment_start + local as f64 * slot;
                        match NoteKind::from_code(code) {
                            Some(kind) => self.push_note(time, kind, length),
                            // Empty slot, balloon markers and roll end
                            None if matches!(code, '0' | '5' | '7' | '8') => {}
                            None => unknown = unknown.or(Some(code)),
                        }
                        local += 1;
                    }
                    if let Some(code) = unknown {
                        self.skip(line, format!("Unknown note code '{}' treated as empty", code));
                    }
                }
                MeasureItem::Command(command) => {
                    let slot = beat_seconds * (length / total as f64);
                    let at = segment_start + local as f64 * slot;
                    match command {
                        Command::BpmChange(_) => {
                            self.apply(command, at);
                            beat_seconds = 60.0 / self.state.bpm;
                            segment_start = at;
                            consumed += local;
                            local = 0;
                        }
                        Command::Delay(delay) => {
                            segment_start = at + delay;
                            consumed += local;
                            local = 0;
                        }
                        command => self.apply(command, at),
                    }
                }
            }
        }

        let remaining = (total - consumed) as f64 / total as f64;
        self.cursor = segment_start + beat_seconds * (length * remaining);
    }

    fn push_note(&mut self, time: f64, kind: NoteKind, length: f64) {
        let state = self.state;
        if let Some(course) = self.course.as_mut() {
            course.chart.notes.push(Note {
                time,
                kind,
                tempo_at_time: state.bpm,
                scroll_at_time: state.scroll,
                measure_at_time: length,
                is_gogo_at_time: state.gogo,
            });
        }
    }

    /// Finish the current course and store it in the chart
    fn flush_course(&mut self) {
        self.flush_directives();
        let Some(builder) = self.course.take() else {
            return;
        };

        // Metadata given before the first COURSE belongs to that course
        if !builder.explicit && builder.measures == 0 {
            self.carried = Some((builder.chart.level, builder.chart.balloons));
            return;
        }

        let offset = self.chart.offset;
        let mut course = builder.chart;

        let before = course.notes.len();
        course.notes.retain_mut(|note| {
            note.time -= offset;
            note.time.is_finite() && note.time >= 0.0
        });
        let dropped = before - course.notes.len();
        if dropped > 0 {
            warn!("course {}: dropped {} notes before time zero after OFFSET", builder.name, dropped);
        }
        // Stable: equal times keep parse order
        course.notes.sort_by(|a, b| a.time.total_cmp(&b.time));

        for events in [
            &mut course.tempo_events,
            &mut course.measure_events,
            &mut course.scroll_events,
            &mut course.gogo_events,
            &mut course.barline_events,
        ] {
            for event in events.iter_mut() {
                event.time -= offset;
            }
        }
        for bar in course.bars.iter_mut() {
            bar.time -= offset;
        }

        if self.chart.courses.insert(builder.name.clone(), course).is_some() {
            warn!("course {} defined twice; keeping the later one", builder.name);
        }
    }

    fn skip(&mut self, line: usize, message: String) {
        warn!("line {}: {}", line, message);
        self.diagnostics.push(Diagnostic { line, message });
    }

    fn parse_finite(&mut self, line: usize, key: &str, value: &str) -> Option<f64> {
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.skip(line, format!("Invalid {} '{}'", key, value));
                None
            }
        }
    }

    fn parse_positive(&mut self, line: usize, key: &str, value: &str) -> Option<f64> {
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Some(v),
            _ => {
                self.skip(line, format!("Invalid {} '{}'", key, value));
                None
            }
        }
    }

    fn parse_override(&mut self, line: usize, text: &str) -> Option<f64> {
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Some(v),
            _ => {
                self.skip(line, format!("Invalid measure override '{}'", text));
                None
            }
        }
    }

    fn parse_balloons(&mut self, line: usize, value: &str) -> Vec<u32> {
        let mut balloons = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.parse::<u32>() {
                Ok(hits) => balloons.push(hits),
                Err(_) => self.skip(line, format!("Invalid BALLOON entry '{}'", entry)),
            }
        }
        balloons
    }
}

/// Parse `n/d` into quarter notes per measure (`n / d * 4`).
fn parse_measure(value: &str) -> Option<f64> {
    let (numerator, denominator) = value.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if !(numerator.is_finite() && denominator.is_finite()) || numerator <= 0.0 || denominator <= 0.0 {
        return None;
    }
    Some(numerator / denominator * 4.0)
}

/// Compile TJA source into a chart, skipping anything malformed
pub fn compile(source: &str) -> Chart {
    Compiler::new().compile(source).chart
}

/// Compile TJA source and report what was skipped
pub fn compile_with_diagnostics(source: &str) -> Compilation {
    Compiler::new().compile(source)
}
