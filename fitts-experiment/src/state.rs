use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use fitts_core::view::{BLACK, BLUE, GREEN, RED, WHITE};
use fitts_core::{
    Bounds, FrameView, ParticipantId, ParticipantSummary, Phase, Point, SessionPhase, Shape,
    TrialRecord, TrialState, classify_click, target_center,
};
use fitts_store::RecordSink;
use fitts_store::consent::write_receipt;
use fitts_timing::Timer;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{AttemptPolicy, ExperimentConfig};
use crate::error::Result;
use crate::generator::{TrialGenerator, build_combinations};
use crate::screening::{ScreeningControl, ScreeningForm, ScreeningLayout};
use crate::summary::SessionTally;
use crate::trial::Trial;

const DEFAULT_SCREEN: (f64, f64) = (1024.0, 768.0);

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    PointerPressed(Point),
    /// Window closed or Escape pressed
    Quit,
    /// A timed screen has been shown long enough
    HoldElapsed,
}

/// Who the session belongs to and where its records go
pub struct SessionContext<S> {
    pub participant_id: ParticipantId,
    pub sink: S,
}

pub struct ExperimentStateMachine<S, T, R>
where
    S: RecordSink,
    T: Timer,
    R: Rng,
{
    pub phase: SessionPhase,
    pub timer: T,
    pub config: ExperimentConfig,
    session: SessionContext<S>,
    generator: TrialGenerator<R>,
    screen_center: Point,
    layout: ScreeningLayout,
    form: ScreeningForm,
    current: Option<Trial<T::Timestamp>>,
    /// Completed trials
    trial_number: usize,
    tally: SessionTally,
    records: Vec<TrialRecord>,
    summary: Option<ParticipantSummary>,
    phase_started: T::Timestamp,
    consent_receipt: Option<PathBuf>,
    finished: bool,
    aborted: bool,
}

impl<S, T, R> ExperimentStateMachine<S, T, R>
where
    S: RecordSink,
    T: Timer,
    R: Rng,
{
    /// Validates the design, assigns this run's participant id and shuffles
    /// the task pool. Nothing is written to the sink yet.
    pub fn new(config: ExperimentConfig, mut sink: S, timer: T, rng: R) -> Result<Self> {
        config.validate()?;
        let combinations =
            build_combinations(&config.diameters, &config.distances, &config.directions)?;
        let generator = TrialGenerator::new(combinations, rng)?;
        let participant_id = sink.next_participant_id()?;
        info!(
            participant = %participant_id,
            sink = %sink.describe(),
            trials = config.trials,
            combinations = generator.combinations().len(),
            policy = ?config.attempt_policy,
            "session created"
        );

        let (width, height) = DEFAULT_SCREEN;
        let phase_started = timer.now();
        Ok(Self {
            phase: SessionPhase::default(),
            timer,
            config,
            session: SessionContext {
                participant_id,
                sink,
            },
            generator,
            screen_center: Point::new(width / 2.0, height / 2.0),
            layout: ScreeningLayout::new(width, height),
            form: ScreeningForm::default(),
            current: None,
            trial_number: 0,
            tally: SessionTally::default(),
            records: Vec::new(),
            summary: None,
            phase_started,
            consent_receipt: None,
            finished: false,
            aborted: false,
        })
    }

    /// Write a consent receipt to `path` when the participant agrees
    pub fn with_consent_receipt(mut self, path: impl Into<PathBuf>) -> Self {
        self.consent_receipt = Some(path.into());
        self
    }

    /// Re-centers the session on a surface of the given size. Fails, leaving
    /// the current geometry untouched, when a target would fall off screen.
    pub fn set_screen_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.config.check_fits(width)?;
        self.screen_center = Point::new(width / 2.0, height / 2.0);
        self.layout = ScreeningLayout::new(width, height);
        Ok(())
    }

    fn advance_phase(&mut self) -> bool {
        match self.phase.next() {
            Some(next) => {
                debug!(from = ?self.phase, to = ?next, "phase change");
                self.phase = next;
                self.phase_started = self.timer.now();
                true
            }
            None => false,
        }
    }

    /// Emits the time-driven events that are due. Call once per frame.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        if self.finished || !self.phase.is_timed() {
            return events;
        }
        if self.timer.elapsed(self.phase_started) >= self.hold_for(self.phase) {
            events.push(ExperimentEvent::HoldElapsed);
        }
        events
    }

    fn hold_for(&self, phase: SessionPhase) -> Duration {
        match phase {
            SessionPhase::ConsentRecorded => Duration::from_millis(self.config.consent_hold_ms),
            SessionPhase::Debrief => Duration::from_millis(self.config.completion_hold_ms),
            _ => Duration::ZERO,
        }
    }

    /// Applies one event. `Ok(false)` means the event had no effect in the
    /// current state; any persistence failure is returned as an error.
    pub fn handle_event(&mut self, event: ExperimentEvent) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }

        match (self.phase, event) {
            (_, ExperimentEvent::Quit) => {
                self.quit();
                Ok(true)
            }

            (phase, ExperimentEvent::HoldElapsed) if phase.is_timed() => {
                if self.advance_phase() {
                    info!(phase = ?self.phase, "hold elapsed");
                } else {
                    info!(participant = %self.session.participant_id, "session finished");
                    self.finished = true;
                }
                Ok(true)
            }

            (phase, ExperimentEvent::PointerPressed(_)) if !phase.allows_input() => Ok(false),

            (phase, ExperimentEvent::PointerPressed(p)) if phase.is_consent() => {
                if !self.layout.hit_agree(p) {
                    return Ok(false);
                }
                self.record_consent()?;
                Ok(self.advance_phase())
            }

            (phase, ExperimentEvent::PointerPressed(p)) if phase.is_screening() => {
                self.handle_questionnaire(p)
            }

            (phase, ExperimentEvent::PointerPressed(p)) if phase.is_trials() => {
                self.handle_trial_press(p)
            }

            _ => Ok(false),
        }
    }

    fn quit(&mut self) {
        if let Some(trial) = self.current.take() {
            info!(
                trial = trial.number,
                state = ?trial.state,
                "quit requested, discarding trial in flight"
            );
        } else {
            info!(phase = ?self.phase, "quit requested");
        }
        self.aborted = self.summary.is_none();
        self.finished = true;
    }

    fn record_consent(&mut self) -> Result<()> {
        match &self.consent_receipt {
            Some(path) => {
                write_receipt(path, Local::now())?;
                info!(receipt = %path.display(), "consent recorded");
            }
            None => info!("consent recorded"),
        }
        Ok(())
    }

    fn handle_questionnaire(&mut self, p: Point) -> Result<bool> {
        match self.layout.hit_questionnaire(p) {
            Some(ScreeningControl::Finish) => {
                let Some(record) = self.form.finish(self.session.participant_id, Utc::now())
                else {
                    debug!(form = ?self.form, "questionnaire incomplete");
                    return Ok(false);
                };
                self.session.sink.append_screening(&record)?;
                info!(
                    participant = %record.participant_id,
                    handedness = record.handedness.as_str(),
                    mouse_usage = record.mouse_usage.label(),
                    "screening stored"
                );
                self.advance_phase();
                self.start_trial();
                Ok(true)
            }
            Some(control) => {
                self.form.select(control);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn start_trial(&mut self) {
        let number = self.trial_number + 1;
        self.current = Some(Trial::new(number, self.timer.now()));
        debug!(trial = number, of = self.config.trials, "square shown");
    }

    pub fn square_bounds(&self) -> Bounds {
        Bounds::centered(
            self.screen_center,
            self.config.square_size,
            self.config.square_size,
        )
    }

    fn handle_trial_press(&mut self, p: Point) -> Result<bool> {
        let square = self.square_bounds();
        let Some(trial) = self.current.as_mut() else {
            return Ok(false);
        };

        match trial.state {
            TrialState::AwaitSquareClick => {
                if !square.contains(p) {
                    return Ok(false);
                }
                let square_time = self.timer.elapsed(trial.timestamps.square_shown).as_secs_f64();
                let combination = self.generator.next_trial();
                trial.square_time = Some(square_time);
                trial.combination = Some(combination);
                trial.timestamps.circle_shown = Some(self.timer.now());
                trial.state = TrialState::AwaitCircleClick;
                debug!(trial = trial.number, square_time, %combination, "circle shown");
                Ok(true)
            }
            TrialState::AwaitCircleClick => {
                let (Some(combination), Some(circle_shown), Some(square_time)) = (
                    trial.combination,
                    trial.timestamps.circle_shown,
                    trial.square_time,
                ) else {
                    warn!(trial = trial.number, "circle state without a target");
                    return Ok(false);
                };

                let target = target_center(
                    self.screen_center,
                    combination.distance as f64,
                    combination.direction,
                );
                let outcome = classify_click(p, target, combination.radius());
                let record = TrialRecord {
                    participant_id: self.session.participant_id,
                    trial_number: trial.number,
                    diameter: combination.diameter,
                    distance: combination.distance,
                    direction: combination.direction,
                    task_time: self.timer.elapsed(circle_shown).as_secs_f64(),
                    distance_travelled: outcome.distance(),
                    hit: outcome.is_hit(),
                    miss: !outcome.is_hit(),
                    square_time,
                    timestamp: Utc::now(),
                };
                self.session.sink.append_trial(&record)?;
                trial.attempts += 1;
                debug!(
                    trial = record.trial_number,
                    hit = record.hit,
                    task_time = record.task_time,
                    distance_travelled = record.distance_travelled,
                    attempt = trial.attempts,
                    "attempt stored"
                );

                let completes =
                    record.hit || self.config.attempt_policy == AttemptPolicy::SingleAttempt;
                self.tally.record_attempt(&record);
                self.records.push(record);

                if completes {
                    trial.state = TrialState::Complete;
                    self.complete_current_trial(square_time)?;
                }
                Ok(true)
            }
            TrialState::Complete => Ok(false),
        }
    }

    fn complete_current_trial(&mut self, square_time: f64) -> Result<()> {
        self.current = None;
        self.tally.complete_trial(square_time);
        self.trial_number += 1;

        if self.trial_number < self.config.trials {
            self.start_trial();
            Ok(())
        } else {
            self.finish_session()
        }
    }

    fn finish_session(&mut self) -> Result<()> {
        let summary = self
            .tally
            .summarize(self.session.participant_id, Utc::now());
        self.session.sink.append_summary(&summary)?;
        info!(
            participant = %summary.participant_id,
            hits = summary.hits,
            misses = summary.misses,
            accuracy = summary.accuracy_percentage,
            average_square_time = summary.average_square_time,
            total_distance = summary.total_distance,
            "summary stored"
        );
        self.summary = Some(summary);
        self.advance_phase();
        Ok(())
    }

    /// What the display surface should draw right now
    pub fn view(&self) -> FrameView {
        match self.phase {
            SessionPhase::Consent => self.layout.consent_view(self.config.trials),
            SessionPhase::ConsentRecorded => self.layout.consent_recorded_view(),
            SessionPhase::Screening => self.layout.questionnaire_view(&self.form),
            SessionPhase::Trials => self.trial_view(),
            SessionPhase::Debrief => {
                let mut view = FrameView::with_background(WHITE);
                view.centered_text(
                    "Thank you for participating!",
                    self.screen_center,
                    36.0,
                    BLUE,
                );
                view
            }
        }
    }

    fn trial_view(&self) -> FrameView {
        let mut view = FrameView::with_background(WHITE);
        if let Some((n, total)) = self.trial_progress() {
            view.text(
                format!("Trial: {n}/{total}"),
                Point::new(20.0, 20.0),
                24.0,
                BLACK,
            );
        }
        match self.current.as_ref() {
            Some(trial) if trial.state == TrialState::AwaitSquareClick => {
                view.push(Shape::Rectangle {
                    bounds: self.square_bounds(),
                    color: GREEN,
                });
            }
            Some(Trial {
                state: TrialState::AwaitCircleClick,
                combination: Some(combination),
                ..
            }) => {
                view.push(Shape::Circle {
                    center: target_center(
                        self.screen_center,
                        combination.distance as f64,
                        combination.direction,
                    ),
                    radius: combination.radius(),
                    color: RED,
                });
            }
            _ => {}
        }
        view
    }

    /// `(current trial, total)` while trials are running
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        if self.phase.is_trials() {
            let total = self.config.trials;
            Some(((self.trial_number + 1).min(total), total))
        } else {
            None
        }
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current.as_ref().map(|t| t.state)
    }

    pub fn current_trial(&self) -> Option<&Trial<T::Timestamp>> {
        self.current.as_ref()
    }

    /// Target center of the circle on screen, if any
    pub fn target(&self) -> Option<Point> {
        let combination = self.current.as_ref()?.combination?;
        Some(target_center(
            self.screen_center,
            combination.distance as f64,
            combination.direction,
        ))
    }

    pub fn screen_center(&self) -> Point {
        self.screen_center
    }

    pub fn layout(&self) -> &ScreeningLayout {
        &self.layout
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.session.participant_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ended by quit before the summary was stored
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Every attempt persisted this session, in order
    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn summary(&self) -> Option<&ParticipantSummary> {
        self.summary.as_ref()
    }

    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    pub fn sink(&self) -> &S {
        &self.session.sink
    }
}
