//! One play-through of a course
//!
//! A [`Session`] is the frame loop's single entry point. Each call to
//! [`Session::tick`] samples the clock once, advances the scheduler, records
//! misses, judges the queued inputs in order and hands back a [`Frame`] for
//! the renderer. There are no callbacks, timers or threads: the host decides
//! when to tick.

use crate::chart::CourseChart;
use crate::config::EngineConfig;
use crate::error::TjaError;
use crate::playback::clock::PlaybackClock;
use crate::playback::judgment::JudgmentEngine;
use crate::playback::scheduler::NoteScheduler;
use crate::playback::stats::SessionStats;
use crate::playback::types::{Frame, InputEvent, JudgmentOutcome, NoteView};
use std::sync::Arc;

pub struct Session<C: PlaybackClock> {
    clock: C,
    scheduler: NoteScheduler,
    engine: JudgmentEngine,
    stats: SessionStats,
    last_outcome: Option<JudgmentOutcome>,
}

impl<C: PlaybackClock> Session<C> {
    pub fn new(course: Arc<CourseChart>, config: &EngineConfig, clock: C) -> Self {
        Self {
            clock,
            scheduler: NoteScheduler::new(course, config),
            engine: JudgmentEngine::from_config(config),
            stats: SessionStats::new(config.scoring),
            last_outcome: None,
        }
    }

    pub fn tick(&mut self, inputs: &[InputEvent]) -> Result<Frame, TjaError> {
        let now = self.clock.now();
        let mut outcomes = self.scheduler.advance(now)?;
        for miss in &outcomes {
            self.stats.record(miss);
        }

        for input in inputs {
            if let Some(outcome) = self.engine.judge(&mut self.scheduler, &mut self.stats, *input) {
                outcomes.push(outcome);
            }
        }

        if let Some(latest) = outcomes.last() {
            self.last_outcome = Some(*latest);
        }

        let course = self.scheduler.course();
        Ok(Frame {
            playback_time: now,
            tempo: course.tempo_at(now),
            gogo: course.is_gogo_at(now),
            notes: self.scheduler.active_notes().iter().map(NoteView::from).collect(),
            outcomes,
            last_outcome: self.last_outcome,
            stats: self.stats.clone(),
        })
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn last_outcome(&self) -> Option<JudgmentOutcome> {
        self.last_outcome
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }
}
