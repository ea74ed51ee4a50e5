use fitts_core::{
    Direction, Handedness, MouseUsage, ParticipantId, ParticipantSummary, Point,
    ScreeningRecord, SessionPhase, TaskCombination, TrialRecord, TrialState,
};
use fitts_experiment::{
    AttemptPolicy, ExperimentConfig, ExperimentError, ExperimentEvent, ExperimentStateMachine,
};
use fitts_store::{MemorySink, RecordSink, StoreError, StoreResult};
use fitts_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;

type Machine<S = MemorySink> = ExperimentStateMachine<S, ManualTimer, StdRng>;

/// Memory sink whose selected tables refuse every write
#[derive(Default)]
struct FailingSink {
    stored: MemorySink,
    screenings: bool,
    trials: bool,
    summaries: bool,
}

fn disk_full() -> StoreError {
    StoreError::Corrupt("disk full".to_string())
}

impl RecordSink for FailingSink {
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId> {
        self.stored.next_participant_id()
    }

    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()> {
        if self.screenings {
            return Err(disk_full());
        }
        self.stored.append_screening(record)
    }

    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()> {
        if self.trials {
            return Err(disk_full());
        }
        self.stored.append_trial(record)
    }

    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()> {
        if self.summaries {
            return Err(disk_full());
        }
        self.stored.append_summary(summary)
    }

    fn describe(&self) -> String {
        "failing sink".to_string()
    }
}

fn small_config(trials: usize, policy: AttemptPolicy) -> ExperimentConfig {
    ExperimentConfig {
        diameters: vec![40, 50],
        distances: vec![100, 200],
        directions: vec![Direction::Left, Direction::Right],
        trials,
        attempt_policy: policy,
        ..ExperimentConfig::default()
    }
}

fn machine<S: RecordSink>(config: ExperimentConfig, sink: S) -> (Machine<S>, ManualTimer) {
    let timer = ManualTimer::new();
    let machine =
        ExperimentStateMachine::new(config, sink, timer.clone(), StdRng::seed_from_u64(42))
            .unwrap();
    (machine, timer)
}

fn press<S: RecordSink>(machine: &mut Machine<S>, p: Point) -> bool {
    machine
        .handle_event(ExperimentEvent::PointerPressed(p))
        .unwrap()
}

fn fire_due_events<S: RecordSink>(machine: &mut Machine<S>) {
    for event in machine.update() {
        machine.handle_event(event).unwrap();
    }
}

/// Consent and hold; leaves the machine on the questionnaire
fn run_to_screening<S: RecordSink>(machine: &mut Machine<S>, timer: &ManualTimer) {
    let agree = machine.layout().agree.center();
    assert!(press(machine, agree));
    assert_eq!(machine.phase, SessionPhase::ConsentRecorded);

    timer.advance_secs(1.0);
    assert!(machine.update().is_empty());
    timer.advance_secs(1.5);
    fire_due_events(machine);
    assert_eq!(machine.phase, SessionPhase::Screening);

    let layout = machine.layout().clone();
    assert!(press(machine, layout.right_hand.center()));
    assert!(press(machine, layout.usage[1].center()));
}

/// Consent, hold, questionnaire; leaves the machine on the first square
fn run_to_trials<S: RecordSink>(machine: &mut Machine<S>, timer: &ManualTimer) {
    run_to_screening(machine, timer);
    let finish = machine.layout().finish.center();
    assert!(press(machine, finish));
    assert_eq!(machine.phase, SessionPhase::Trials);
    assert_eq!(
        machine.current_trial_state(),
        Some(TrialState::AwaitSquareClick)
    );
}

fn click_square<S: RecordSink>(machine: &mut Machine<S>, timer: &ManualTimer) -> TaskCombination {
    timer.advance_secs(0.5);
    let center = machine.screen_center();
    assert!(press(machine, center));
    machine.current_trial().unwrap().combination.unwrap()
}

fn click_target<S: RecordSink>(machine: &mut Machine<S>, timer: &ManualTimer) {
    timer.advance_secs(0.8);
    let target = machine.target().unwrap();
    assert!(press(machine, target));
}

#[test]
fn exact_center_click_is_a_zero_distance_hit() {
    let (mut m, timer) = machine(small_config(200, AttemptPolicy::RetryUntilHit), MemorySink::new());
    run_to_trials(&mut m, &timer);

    let wanted = TaskCombination {
        diameter: 40,
        distance: 100,
        direction: Direction::Left,
    };
    let mut seen = false;
    while !seen {
        let combination = click_square(&mut m, &timer);
        if combination == wanted {
            assert_eq!(m.target(), Some(Point::new(412.0, 384.0)));
            seen = true;
        }
        click_target(&mut m, &timer);
    }

    let record = m
        .records()
        .iter()
        .find(|r| r.combination() == wanted)
        .unwrap();
    assert!(record.task_time > 0.0);
    assert_eq!(record.distance_travelled, 0.0);
    assert!(record.hit);
    assert!(!record.miss);
    assert!((record.square_time - 0.5).abs() < 1e-9);
}

#[test]
fn miss_keeps_the_target_under_retry_until_hit() {
    let (mut m, timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), MemorySink::new());
    run_to_trials(&mut m, &timer);
    let combination = click_square(&mut m, &timer);

    timer.advance_secs(0.3);
    let target = m.target().unwrap();
    let off = Point::new(target.x, target.y + combination.radius() + 10.0);
    assert!(press(&mut m, off));

    assert_eq!(m.records().len(), 1);
    assert!(m.records()[0].miss);
    assert_eq!(m.current_trial_state(), Some(TrialState::AwaitCircleClick));
    assert_eq!(m.current_trial().unwrap().combination, Some(combination));

    click_target(&mut m, &timer);
    let records = m.records();
    assert_eq!(records.len(), 2);
    assert!(records[1].hit);
    assert!(records.iter().all(|r| r.trial_number == 1));
    assert!(records[1].task_time > records[0].task_time);

    let summary = m.summary().unwrap();
    assert_eq!((summary.hits, summary.misses), (1, 1));
    assert_eq!(summary.accuracy_percentage, 50.0);
    assert!((summary.average_square_time - 0.5).abs() < 1e-9);
    assert_eq!(m.phase, SessionPhase::Debrief);
    assert_eq!(m.sink().trials.len(), 2);
    assert_eq!(m.sink().summaries.len(), 1);
}

#[test]
fn miss_completes_the_trial_under_single_attempt() {
    let (mut m, timer) = machine(small_config(2, AttemptPolicy::SingleAttempt), MemorySink::new());
    run_to_trials(&mut m, &timer);
    assert_eq!(m.trial_progress(), Some((1, 2)));
    click_square(&mut m, &timer);

    let target = m.target().unwrap();
    assert!(press(&mut m, Point::new(target.x, target.y - 300.0)));

    assert_eq!(m.records().len(), 1);
    assert!(m.records()[0].miss);
    assert_eq!(m.trial_progress(), Some((2, 2)));
    assert_eq!(m.current_trial_state(), Some(TrialState::AwaitSquareClick));
    assert_eq!(m.tally().trials_run, 1);
}

#[test]
fn presses_outside_the_square_are_ignored() {
    let (mut m, timer) = machine(small_config(3, AttemptPolicy::RetryUntilHit), MemorySink::new());
    run_to_trials(&mut m, &timer);

    assert!(!press(&mut m, Point::new(10.0, 10.0)));
    assert!(!press(&mut m, Point::new(512.0, 397.0)));
    assert_eq!(m.current_trial_state(), Some(TrialState::AwaitSquareClick));
    assert!(m.view().circles().next().is_none());

    // the square's corner still counts
    assert!(press(&mut m, Point::new(499.5, 371.5)));
    assert_eq!(m.current_trial_state(), Some(TrialState::AwaitCircleClick));
    assert_eq!(m.view().circles().count(), 1);
    assert!(m.view().texts().any(|t| t == "Trial: 1/3"));
}

#[test]
fn finish_is_rejected_until_both_answers_are_given() {
    let (mut m, timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), MemorySink::new());
    let agree = m.layout().agree.center();
    press(&mut m, agree);
    timer.advance_secs(2.0);
    fire_due_events(&mut m);
    let layout = m.layout().clone();

    assert!(!press(&mut m, layout.finish.center()));
    press(&mut m, layout.left_hand.center());
    assert!(!press(&mut m, layout.finish.center()));
    assert_eq!(m.phase, SessionPhase::Screening);
    assert!(m.sink().screenings.is_empty());

    press(&mut m, layout.usage[2].center());
    assert!(press(&mut m, layout.finish.center()));
    let stored = &m.sink().screenings;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].participant_id, ParticipantId(1));
    assert_eq!(stored[0].handedness, Handedness::Left);
    assert_eq!(stored[0].mouse_usage, MouseUsage::MoreThanEight);
}

#[test]
fn quit_mid_trial_writes_nothing_for_it() {
    let (mut m, timer) = machine(small_config(5, AttemptPolicy::RetryUntilHit), MemorySink::new());
    run_to_trials(&mut m, &timer);
    click_square(&mut m, &timer);

    assert!(m.handle_event(ExperimentEvent::Quit).unwrap());
    assert!(m.is_finished());
    assert!(m.is_aborted());
    assert!(m.current_trial().is_none());

    let target = Point::new(512.0, 384.0);
    assert!(!press(&mut m, target));
    assert!(m.sink().trials.is_empty());
    assert!(m.sink().summaries.is_empty());
    assert_eq!(m.sink().screenings.len(), 1);
}

#[test]
fn completed_session_stores_summary_and_ends_after_hold() {
    let sink = MemorySink {
        screenings: vec![ScreeningRecord {
            participant_id: ParticipantId(5),
            handedness: Handedness::Right,
            mouse_usage: MouseUsage::UpToTwo,
            timestamp: chrono::Utc::now(),
        }],
        ..MemorySink::default()
    };
    let (mut m, timer) = machine(small_config(3, AttemptPolicy::RetryUntilHit), sink);
    assert_eq!(m.participant_id(), ParticipantId(6));
    run_to_trials(&mut m, &timer);

    for _ in 0..3 {
        click_square(&mut m, &timer);
        click_target(&mut m, &timer);
    }

    assert_eq!(m.phase, SessionPhase::Debrief);
    let summary = m.sink().summaries[0].clone();
    assert_eq!(summary.participant_id, ParticipantId(6));
    assert_eq!(summary.hits, 3);
    assert_eq!(summary.accuracy_percentage, 100.0);
    assert!(m.sink().trials.iter().all(|r| r.participant_id == ParticipantId(6)));
    assert!(m.view().texts().any(|t| t == "Thank you for participating!"));

    timer.advance_secs(1.0);
    assert!(m.update().is_empty());
    timer.advance_secs(2.0);
    fire_due_events(&mut m);
    assert!(m.is_finished());
    assert!(!m.is_aborted());
}

#[test]
fn agreeing_writes_a_consent_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("consent.txt");
    let (m, _timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), MemorySink::new());
    let mut m = m.with_consent_receipt(&receipt);

    assert!(!press(&mut m, Point::new(5.0, 5.0)));
    assert!(!receipt.exists());
    let agree = m.layout().agree.center();
    assert!(press(&mut m, agree));
    let text = std::fs::read_to_string(&receipt).unwrap();
    assert!(text.contains("Your consent has been recorded on"));
}

#[test]
fn invalid_design_is_rejected_before_the_session_starts() {
    let config = ExperimentConfig {
        distances: Vec::new(),
        ..ExperimentConfig::default()
    };
    let result = ExperimentStateMachine::new(
        config,
        MemorySink::new(),
        ManualTimer::new(),
        StdRng::seed_from_u64(1),
    );
    assert!(matches!(
        result,
        Err(ExperimentError::EmptyCombinationSet("distances"))
    ));
}

#[test]
fn quit_during_debrief_is_not_an_abort() {
    let (mut m, timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), MemorySink::new());
    run_to_trials(&mut m, &timer);
    click_square(&mut m, &timer);
    click_target(&mut m, &timer);
    assert_eq!(m.phase, SessionPhase::Debrief);

    assert!(m.handle_event(ExperimentEvent::Quit).unwrap());
    assert!(m.is_finished());
    assert!(!m.is_aborted());
    assert!(m.summary().is_some());
}

#[test]
fn presses_during_holds_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("consent.txt");
    let (m, timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), MemorySink::new());
    let mut m = m.with_consent_receipt(&receipt);

    let agree = m.layout().agree.center();
    assert!(press(&mut m, agree));
    std::fs::remove_file(&receipt).unwrap();
    assert!(!press(&mut m, agree));
    assert!(!receipt.exists());
    assert_eq!(m.phase, SessionPhase::ConsentRecorded);

    timer.advance_secs(2.0);
    fire_due_events(&mut m);
    let layout = m.layout().clone();
    press(&mut m, layout.left_hand.center());
    press(&mut m, layout.usage[0].center());
    press(&mut m, layout.finish.center());
    click_square(&mut m, &timer);
    click_target(&mut m, &timer);
    assert_eq!(m.phase, SessionPhase::Debrief);

    let center = m.screen_center();
    assert!(!press(&mut m, center));
    assert_eq!(m.phase, SessionPhase::Debrief);
    assert_eq!(m.records().len(), 1);
}

#[test]
fn failed_trial_write_aborts_without_counting_the_attempt() {
    let sink = FailingSink {
        trials: true,
        ..FailingSink::default()
    };
    let (mut m, timer) = machine(small_config(2, AttemptPolicy::RetryUntilHit), sink);
    run_to_trials(&mut m, &timer);
    click_square(&mut m, &timer);
    let tally_before = m.tally().clone();

    let target = m.target().unwrap();
    let result = m.handle_event(ExperimentEvent::PointerPressed(target));
    assert!(matches!(result, Err(ExperimentError::Store(_))));

    assert!(m.records().is_empty());
    assert_eq!(m.tally(), &tally_before);
    assert_eq!(m.phase, SessionPhase::Trials);
    assert_eq!(m.current_trial_state(), Some(TrialState::AwaitCircleClick));
    assert_eq!(m.current_trial().unwrap().attempts, 0);
    assert!(m.sink().stored.trials.is_empty());
}

#[test]
fn failed_screening_write_keeps_the_questionnaire_up() {
    let sink = FailingSink {
        screenings: true,
        ..FailingSink::default()
    };
    let (mut m, timer) = machine(small_config(2, AttemptPolicy::RetryUntilHit), sink);
    run_to_screening(&mut m, &timer);

    let finish = m.layout().finish.center();
    let result = m.handle_event(ExperimentEvent::PointerPressed(finish));
    assert!(matches!(result, Err(ExperimentError::Store(_))));
    assert_eq!(m.phase, SessionPhase::Screening);
    assert!(m.current_trial().is_none());
    assert!(m.sink().stored.screenings.is_empty());
}

#[test]
fn failed_summary_write_leaves_the_session_unfinished() {
    let sink = FailingSink {
        summaries: true,
        ..FailingSink::default()
    };
    let (mut m, timer) = machine(small_config(1, AttemptPolicy::RetryUntilHit), sink);
    run_to_trials(&mut m, &timer);
    click_square(&mut m, &timer);
    timer.advance_secs(0.8);

    let target = m.target().unwrap();
    let result = m.handle_event(ExperimentEvent::PointerPressed(target));
    assert!(matches!(result, Err(ExperimentError::Store(_))));
    assert_eq!(m.phase, SessionPhase::Trials);
    assert!(m.summary().is_none());
    assert!(m.sink().stored.summaries.is_empty());
    assert!(!m.is_finished());
}

#[test]
fn targets_must_fit_the_real_surface() {
    let (mut m, _timer) = machine(ExperimentConfig::default(), MemorySink::new());

    let result = m.set_screen_size(600.0, 768.0);
    assert!(matches!(result, Err(ExperimentError::InvalidConfig(_))));
    assert_eq!(m.screen_center(), Point::new(512.0, 384.0));

    m.set_screen_size(900.0, 700.0).unwrap();
    assert_eq!(m.screen_center(), Point::new(450.0, 350.0));
}
