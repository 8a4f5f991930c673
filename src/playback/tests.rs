use super::*;
use crate::api::select_course;
use crate::chart::{CourseChart, Note, NoteKind};
use crate::config::EngineConfig;
use crate::error::TjaError;
use crate::compile;
use std::sync::Arc;

fn note(time: f64, kind: NoteKind) -> Note {
    Note {
        time,
        kind,
        tempo_at_time: 120.0,
        scroll_at_time: 1.0,
        measure_at_time: 4.0,
        is_gogo_at_time: false,
    }
}

fn course(notes: Vec<Note>) -> Arc<CourseChart> {
    Arc::new(CourseChart {
        notes,
        ..Default::default()
    })
}

fn primary_course(times: &[f64]) -> Arc<CourseChart> {
    course(times.iter().map(|&t| note(t, NoteKind::Primary)).collect())
}

/// Scheduler advanced to `now`, with a fresh engine and stats
fn setup(times: &[f64], now: f64) -> (NoteScheduler, JudgmentEngine, SessionStats) {
    let config = EngineConfig::default();
    let mut scheduler = NoteScheduler::new(primary_course(times), &config);
    scheduler.advance(now).unwrap();
    (scheduler, JudgmentEngine::from_config(&config), SessionStats::new(config.scoring))
}

fn press(timestamp: f64) -> InputEvent {
    InputEvent::press(InputAction::Primary, timestamp)
}

#[test]
fn test_judge_perfect() {
    let (mut scheduler, engine, mut stats) = setup(&[10.0], 10.0);
    let outcome = engine.judge(&mut scheduler, &mut stats, press(10.05)).unwrap();

    assert_eq!(outcome.category, JudgmentCategory::Perfect);
    assert_eq!(outcome.note_index, 0);
    assert!(outcome.time_delta > 0.0); // late
    assert!(scheduler.active_notes().is_empty());
    assert_eq!(stats.score, 100);
    assert_eq!(stats.combo, 1);
}

#[test]
fn test_judge_good() {
    let (mut scheduler, engine, mut stats) = setup(&[10.0], 10.0);
    let outcome = engine.judge(&mut scheduler, &mut stats, press(10.10)).unwrap();

    assert_eq!(outcome.category, JudgmentCategory::Good);
    assert!(scheduler.active_notes().is_empty());
    assert_eq!(stats.score, 50);
    assert_eq!(stats.combo, 1);
}

#[test]
fn test_judge_bad_keeps_note_resolved() {
    let (mut scheduler, engine, mut stats) = setup(&[10.0], 10.0);
    let outcome = engine.judge(&mut scheduler, &mut stats, press(10.20)).unwrap();

    assert_eq!(outcome.category, JudgmentCategory::Bad);
    assert_eq!(stats.score, 0);
    assert_eq!(stats.combo, 0);
    assert_eq!(scheduler.active_notes().len(), 1);
    assert_eq!(scheduler.active_notes()[0].state, JudgmentState::Resolved(outcome));
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_judge_beyond_bad_window_resets_combo() {
    let (mut scheduler, engine, mut stats) = setup(&[9.0, 10.0], 9.0);
    engine.judge(&mut scheduler, &mut stats, press(9.0)).unwrap();
    assert_eq!(stats.combo, 1);

    scheduler.advance(10.0).unwrap();
    let outcome = engine.judge(&mut scheduler, &mut stats, press(10.30));

    assert_eq!(outcome, None);
    assert_eq!(stats.combo, 0);
    assert_eq!(stats.miss, 0);
    assert_eq!(stats.max_combo, 1);
    assert_eq!(scheduler.pending_count(), 1);
}

#[test]
fn test_double_press_counts_once() {
    let (mut scheduler, engine, mut stats) = setup(&[10.0], 10.0);
    assert!(engine.judge(&mut scheduler, &mut stats, press(10.0)).is_some());
    assert_eq!(engine.judge(&mut scheduler, &mut stats, press(10.01)), None);

    assert_eq!(stats.score, 100);
    assert_eq!(stats.combo, 1);
    assert_eq!(stats.perfect, 1);
}

#[test]
fn test_double_press_on_bad_note_counts_once() {
    let (mut scheduler, engine, mut stats) = setup(&[10.0], 10.0);
    engine.judge(&mut scheduler, &mut stats, press(10.2)).unwrap();
    assert_eq!(engine.judge(&mut scheduler, &mut stats, press(10.19)), None);

    assert_eq!(stats.bad, 1);
    assert_eq!(stats.total_resolved(), 1);
}

#[test]
fn test_held_key_is_ignored() {
    let (mut scheduler, engine, mut stats) = setup(&[1.0, 10.0], 1.0);
    engine.judge(&mut scheduler, &mut stats, press(1.0)).unwrap();

    let repeat = InputEvent {
        is_new_press: false,
        ..press(5.0)
    };
    assert_eq!(engine.judge(&mut scheduler, &mut stats, repeat), None);
    assert_eq!(stats.combo, 1);
}

#[test]
fn test_tie_goes_to_earlier_note() {
    let (mut scheduler, engine, mut stats) = setup(&[1.0, 1.25], 1.0);
    let outcome = engine.judge(&mut scheduler, &mut stats, press(1.125)).unwrap();

    assert_eq!(outcome.note_index, 0);
    assert_eq!(outcome.category, JudgmentCategory::Good);
    assert_eq!(outcome.time_delta, 0.125);
    assert_eq!(scheduler.active_notes()[0].index, 1);
}

#[test]
fn test_kind_mismatch_still_counts() {
    let config = EngineConfig::default();
    let mut scheduler = NoteScheduler::new(course(vec![note(2.0, NoteKind::Secondary)]), &config);
    let engine = JudgmentEngine::from_config(&config);
    let mut stats = SessionStats::new(config.scoring);
    scheduler.advance(2.0).unwrap();

    let outcome = engine.judge(&mut scheduler, &mut stats, press(2.0)).unwrap();
    assert_eq!(outcome.category, JudgmentCategory::Perfect);
}

#[test]
fn test_activation_and_progress() {
    // 4 beats at 120 BPM = 2 seconds of lookahead
    let config = EngineConfig::default();
    let mut scheduler = NoteScheduler::new(primary_course(&[4.0]), &config);
    assert_eq!(scheduler.lookahead_seconds(&note(4.0, NoteKind::Primary)), 2.0);

    scheduler.advance(1.9).unwrap();
    assert!(scheduler.active_notes().is_empty());

    scheduler.advance(2.0).unwrap();
    assert_eq!(scheduler.active_notes().len(), 1);
    assert_eq!(scheduler.active_notes()[0].progress, 0.0);

    scheduler.advance(3.0).unwrap();
    assert_eq!(scheduler.active_notes()[0].progress, 0.5);

    scheduler.advance(4.0).unwrap();
    assert_eq!(scheduler.active_notes()[0].progress, 1.0);
}

#[test]
fn test_slow_note_spawns_on_its_own_lookahead() {
    // The second note has a much longer lookahead than the first
    let fast = Note {
        tempo_at_time: 240.0,
        ..note(1.0, NoteKind::Primary)
    };
    let slow = Note {
        tempo_at_time: 30.0,
        ..note(1.5, NoteKind::Primary)
    };
    let mut scheduler = NoteScheduler::new(course(vec![fast, slow]), &EngineConfig::default());

    scheduler.advance(-7.0).unwrap();
    assert!(scheduler.active_notes().is_empty());

    // 4 beats at 30 BPM = 8 seconds before 1.5
    scheduler.advance(-6.5).unwrap();
    assert_eq!(scheduler.active_notes().len(), 1);
    assert_eq!(scheduler.active_notes()[0].index, 1);
    assert_eq!(scheduler.active_notes()[0].progress, 0.0);

    scheduler.advance(0.0).unwrap();
    let indices: Vec<usize> = scheduler.active_notes().iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(scheduler.active_notes()[0].progress, 0.0);
    assert_eq!(scheduler.active_notes()[1].progress, 0.8125);
    assert!(!scheduler.is_finished());
}

#[test]
fn test_repeat_press_in_mixed_tempo_course() {
    let fast = Note {
        tempo_at_time: 240.0,
        ..note(3.0, NoteKind::Primary)
    };
    let slow = Note {
        tempo_at_time: 30.0,
        ..note(3.5, NoteKind::Primary)
    };
    let config = EngineConfig::default();
    let mut scheduler = NoteScheduler::new(course(vec![fast, slow]), &config);
    let engine = JudgmentEngine::from_config(&config);
    let mut stats = SessionStats::new(config.scoring);

    // Only the slow note has spawned by now
    scheduler.advance(1.0).unwrap();
    assert_eq!(scheduler.active_notes().len(), 1);
    assert_eq!(scheduler.active_notes()[0].index, 1);

    scheduler.advance(3.0).unwrap();
    assert_eq!(engine.judge(&mut scheduler, &mut stats, press(3.0)).unwrap().note_index, 0);
    assert_eq!(engine.judge(&mut scheduler, &mut stats, press(3.5)).unwrap().note_index, 1);
    assert_eq!(engine.judge(&mut scheduler, &mut stats, press(3.52)), None);
    assert_eq!(stats.combo, 2);
    assert!(scheduler.is_finished());
}

#[test]
fn test_unhit_note_expires_as_miss() {
    let (mut scheduler, _, _) = setup(&[1.0], 1.0);

    assert!(scheduler.advance(1.25).unwrap().is_empty());

    let misses = scheduler.advance(1.3).unwrap();
    assert_eq!(misses.len(), 1);
    assert_eq!(misses[0].category, JudgmentCategory::Miss);
    assert_eq!(misses[0].note_index, 0);
    assert_eq!(scheduler.active_notes()[0].state, JudgmentState::Expired);
    assert!(!scheduler.is_finished());

    // Miss is reported once
    assert!(scheduler.advance(1.4).unwrap().is_empty());

    scheduler.advance(1.56).unwrap();
    assert!(scheduler.active_notes().is_empty());
    assert!(scheduler.is_finished());
}

#[test]
fn test_bad_note_decays_without_miss() {
    let (mut scheduler, engine, mut stats) = setup(&[1.0], 1.0);
    engine.judge(&mut scheduler, &mut stats, press(1.2)).unwrap();

    assert!(scheduler.advance(1.3).unwrap().is_empty());
    assert_eq!(scheduler.active_notes().len(), 1);

    assert!(scheduler.advance(1.6).unwrap().is_empty());
    assert!(scheduler.active_notes().is_empty());
}

#[test]
fn test_large_jump_spawns_and_expires() {
    let config = EngineConfig::default();
    let mut scheduler = NoteScheduler::new(primary_course(&[1.0, 2.0]), &config);

    let misses = scheduler.advance(5.0).unwrap();
    assert_eq!(misses.len(), 2);
    assert_eq!(misses[0].note_index, 0);
    assert_eq!(misses[1].note_index, 1);
    assert!(scheduler.is_finished());
}

#[test]
fn test_rewound_clock_is_rejected() {
    let (mut scheduler, _, _) = setup(&[5.0], 2.0);

    let result = scheduler.advance(1.0);
    assert_eq!(result, Err(TjaError::ClockRewound { previous: 2.0, now: 1.0 }));
    assert_eq!(scheduler.playback_time(), Some(2.0));

    assert!(scheduler.advance(f64::NAN).is_err());
    assert_eq!(scheduler.playback_time(), Some(2.0));

    // Same time again is fine
    assert!(scheduler.advance(2.0).is_ok());
}

#[test]
fn test_session_round() {
    let chart = compile("BPM:120\nCOURSE:Oni\n#START\n1010,\n#END\n");
    let course = select_course(&chart, "Oni").unwrap();
    let clock = ManualClock::new(-2.0);
    let mut session = Session::new(course, &EngineConfig::default(), clock);

    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.playback_time, -2.0);
    assert_eq!(frame.notes.len(), 1);
    assert_eq!(frame.notes[0].progress, 0.0);
    assert_eq!(frame.last_outcome, None);

    session.clock().set(0.0);
    let frame = session.tick(&[press(0.01)]).unwrap();
    assert_eq!(frame.outcomes.len(), 1);
    assert_eq!(frame.outcomes[0].category, JudgmentCategory::Perfect);
    assert_eq!(frame.notes.len(), 1); // second note has spawned

    session.clock().set(1.5);
    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.outcomes[0].category, JudgmentCategory::Miss);
    assert_eq!(frame.last_outcome.map(|o| o.note_index), Some(1));
    assert_eq!(frame.stats.accuracy(), 50.0);

    // Feedback persists on quiet frames
    session.clock().set(1.6);
    let frame = session.tick(&[]).unwrap();
    assert!(frame.outcomes.is_empty());
    assert_eq!(frame.last_outcome.map(|o| o.category), Some(JudgmentCategory::Miss));

    session.clock().set(3.0);
    session.tick(&[]).unwrap();
    assert!(session.is_finished());
    assert_eq!(session.stats().perfect, 1);
    assert_eq!(session.stats().miss, 1);
}

#[test]
fn test_session_rewind_leaves_state() {
    let chart = compile("BPM:120\n1000,\n");
    let course = select_course(&chart, "Oni").unwrap();
    let mut session = Session::new(course, &EngineConfig::default(), ManualClock::new(1.0));
    session.tick(&[]).unwrap();

    session.clock().set(0.5);
    assert!(matches!(session.tick(&[]), Err(TjaError::ClockRewound { .. })));
    assert_eq!(session.scheduler().playback_time(), Some(1.0));
}

#[test]
fn test_gogo_hit_scores_with_multiplier() {
    let chart = compile("BPM:120\nCOURSE:Oni\n#START\n#GOGOSTART\n1000,\n#END\n");
    let course = select_course(&chart, "Oni").unwrap();
    let mut config = EngineConfig::default();
    config.scoring.gogo_multiplier = 1.5;
    let mut session = Session::new(course, &config, ManualClock::new(0.0));

    let frame = session.tick(&[press(0.0)]).unwrap();
    assert!(frame.outcomes[0].gogo);
    assert_eq!(frame.stats.score, 150);
}

#[test]
fn test_frame_reports_tempo_and_gogo() {
    let chart = compile("BPM:120\nCOURSE:Oni\n1000,\n#BPMCHANGE 240\n#GOGOSTART\n1000,\n#GOGOEND\n1000,\n");
    let course = select_course(&chart, "Oni").unwrap();
    let mut session = Session::new(course, &EngineConfig::default(), ManualClock::new(-1.0));

    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.tempo, None);
    assert!(!frame.gogo);

    session.clock().set(1.0);
    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.tempo, Some(120.0));
    assert!(!frame.gogo);

    // Second measure starts at 2.0 and lasts 1 second at 240 BPM
    session.clock().set(2.5);
    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.tempo, Some(240.0));
    assert!(frame.gogo);

    session.clock().set(3.5);
    let frame = session.tick(&[]).unwrap();
    assert_eq!(frame.tempo, Some(240.0));
    assert!(!frame.gogo);
}

#[test]
fn test_session_with_closure_clock() {
    let chart = compile("BPM:120\n1000,\n");
    let course = select_course(&chart, "Oni").unwrap();
    let mut session = Session::new(course, &EngineConfig::default(), || 0.0);

    let frame = session.tick(&[press(0.0)]).unwrap();
    assert_eq!(frame.stats.combo, 1);
}
