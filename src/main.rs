use serde::Serialize;
use std::env;
use std::process;
use tja::{
    load_chart, start_session, Chart, Diagnostic, EngineConfig, InputAction, InputEvent, ManualClock, SessionStats,
    TjaError,
};

const USAGE: &str = "Usage: tja [--config engine.yaml] [--course NAME] [--autoplay] <chart.tja>";
const AUTOPLAY_FPS: f64 = 60.0;
/// Seconds simulated past the last note before autoplay gives up
const AUTOPLAY_TAIL: f64 = 10.0;

struct Args {
    chart_path: String,
    config_path: Option<String>,
    course: Option<String>,
    autoplay: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseSummary {
    name: String,
    level: u32,
    note_count: usize,
    last_note_time: f64,
    balloons: Vec<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartSummary<'a> {
    title: &'a str,
    subtitle: &'a str,
    wave: Option<&'a str>,
    initial_bpm: f64,
    offset: f64,
    demo_start: f64,
    courses: Vec<CourseSummary>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AutoplayReport {
    course: String,
    playback_time: f64,
    accuracy: f64,
    stats: SessionStats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut chart_path = None;
    let mut config_path = None;
    let mut course = None;
    let mut autoplay = false;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => config_path = Some(raw.next().ok_or("--config needs a file")?),
            "--course" => course = Some(raw.next().ok_or("--course needs a name")?),
            "--autoplay" => autoplay = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ if chart_path.is_some() => return Err(format!("Unexpected argument: {}", arg)),
            _ => chart_path = Some(arg),
        }
    }

    Ok(Args {
        chart_path: chart_path.ok_or("No chart file given")?,
        config_path,
        course,
        autoplay,
    })
}

fn run(args: &Args) -> Result<(), TjaError> {
    let config = match &args.config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let compilation = load_chart(&args.chart_path)?;
    log::info!(
        "Compiled '{}': {} course(s), {} diagnostic(s)",
        args.chart_path,
        compilation.chart.courses.len(),
        compilation.diagnostics.len()
    );

    let output = if args.autoplay {
        let course = match &args.course {
            Some(name) => name.clone(),
            None => default_course(&compilation.chart)?,
        };
        to_json(&autoplay(&compilation.chart, &course, &config)?)
    } else {
        to_json(&summarize(&compilation.chart, &compilation.diagnostics))
    };

    println!("{}", output);
    Ok(())
}

fn summarize<'a>(chart: &'a Chart, diagnostics: &'a [Diagnostic]) -> ChartSummary<'a> {
    ChartSummary {
        title: &chart.title,
        subtitle: &chart.subtitle,
        wave: chart.wave.as_deref(),
        initial_bpm: chart.initial_bpm,
        offset: chart.offset,
        demo_start: chart.demo_start,
        courses: chart
            .courses
            .iter()
            .map(|(name, course)| CourseSummary {
                name: name.clone(),
                level: course.level,
                note_count: course.notes.len(),
                last_note_time: course.last_note_time(),
                balloons: course.balloons.clone(),
            })
            .collect(),
        diagnostics,
    }
}

/// The hardest course with notes, so autoplay without `--course` plays something
fn default_course(chart: &Chart) -> Result<String, TjaError> {
    const ORDER: [&str; 5] = ["Edit", "Oni", "Hard", "Normal", "Easy"];
    ORDER
        .iter()
        .copied()
        .chain(chart.courses.keys().map(String::as_str))
        .find(|name| chart.courses.get(*name).map_or(false, |c| !c.notes.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| TjaError::NoPlayableCourse {
            course: "any".to_string(),
        })
}

/// Play a course with a press exactly on every note
fn autoplay(chart: &Chart, course: &str, config: &EngineConfig) -> Result<AutoplayReport, TjaError> {
    let mut session = start_session(chart, course, config, ManualClock::new(0.0))?;
    let notes = session.scheduler().course().notes.clone();
    let end = notes.last().map_or(0.0, |n| n.time) + AUTOPLAY_TAIL;

    let mut next_press = 0;
    let mut frame = 0u64;
    let mut now = 0.0;
    while !session.is_finished() && now <= end {
        now = frame as f64 / AUTOPLAY_FPS;
        session.clock().set(now);

        let mut inputs = Vec::new();
        while let Some(note) = notes.get(next_press).filter(|n| n.time <= now) {
            inputs.push(InputEvent::press(InputAction::from(note.kind), note.time));
            next_press += 1;
        }

        session.tick(&inputs)?;
        frame += 1;
    }

    log::info!("Autoplay of {} stopped at {:.3}s", course, now);
    let stats = session.stats().clone();
    Ok(AutoplayReport {
        course: course.to_string(),
        playback_time: now,
        accuracy: stats.accuracy(),
        stats,
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Plain data with string keys always serializes
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}
