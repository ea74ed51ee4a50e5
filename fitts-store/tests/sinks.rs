use chrono::Utc;
use fitts_core::{
    Direction, Handedness, MouseUsage, ParticipantId, ParticipantSummary, ScreeningRecord,
    TrialRecord,
};
use fitts_store::{
    CsvSink, MemorySink, RecordSink, SqliteSink, StorageConfig, StorageMode, StoreError,
    export_workbook,
};

fn screening(id: u32) -> ScreeningRecord {
    ScreeningRecord {
        participant_id: ParticipantId(id),
        handedness: Handedness::Right,
        mouse_usage: MouseUsage::ThreeToEight,
        timestamp: Utc::now(),
    }
}

fn trial(id: u32, trial_number: usize, hit: bool) -> TrialRecord {
    TrialRecord {
        participant_id: ParticipantId(id),
        trial_number,
        diameter: 40,
        distance: 100,
        direction: Direction::Left,
        task_time: 0.42,
        distance_travelled: if hit { 3.0 } else { 31.5 },
        hit,
        miss: !hit,
        square_time: 0.5,
        timestamp: Utc::now(),
    }
}

fn summary(id: u32) -> ParticipantSummary {
    ParticipantSummary {
        participant_id: ParticipantId(id),
        total_distance: 34.5,
        hits: 1,
        misses: 1,
        accuracy_percentage: 50.0,
        average_square_time: 0.5,
        timestamp: Utc::now(),
    }
}

fn assert_id_sequence(sink: &mut dyn RecordSink) {
    assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(1));
    for id in [1, 2, 5] {
        sink.append_screening(&screening(id)).unwrap();
    }
    assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(6));
}

#[test]
fn memory_sink_assigns_max_plus_one() {
    assert_id_sequence(&mut MemorySink::new());
}

#[test]
fn sqlite_sink_assigns_max_plus_one() {
    assert_id_sequence(&mut SqliteSink::in_memory().unwrap());
}

#[test]
fn csv_sink_assigns_max_plus_one() {
    let dir = tempfile::tempdir().unwrap();
    assert_id_sequence(&mut CsvSink::open(dir.path()).unwrap());
}

#[test]
fn next_id_considers_trial_rows_too() {
    let mut sink = SqliteSink::in_memory().unwrap();
    sink.append_screening(&screening(3)).unwrap();
    sink.append_trial(&trial(7, 1, true)).unwrap();
    assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(8));
}

#[test]
fn exhausted_id_space_is_reported_not_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn RecordSink>> = vec![
        Box::new(MemorySink::new()),
        Box::new(SqliteSink::in_memory().unwrap()),
        Box::new(CsvSink::open(dir.path()).unwrap()),
    ];
    for mut sink in sinks {
        sink.append_screening(&screening(u32::MAX)).unwrap();
        assert!(
            matches!(sink.next_participant_id(), Err(StoreError::Corrupt(_))),
            "{}",
            sink.describe()
        );
    }
}

#[test]
fn sqlite_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db").join("fitts.db");
    {
        let mut sink = SqliteSink::open(&path).unwrap();
        sink.append_screening(&screening(1)).unwrap();
        sink.append_trial(&trial(1, 1, false)).unwrap();
        sink.append_trial(&trial(1, 1, true)).unwrap();
        sink.append_summary(&summary(1)).unwrap();
    }
    let mut sink = SqliteSink::open(&path).unwrap();
    assert_eq!(sink.count_trials(ParticipantId(1)).unwrap(), 2);
    assert_eq!(sink.summary_accuracy(ParticipantId(1)).unwrap(), Some(50.0));
    assert_eq!(sink.summary_accuracy(ParticipantId(2)).unwrap(), None);
    assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(2));
}

#[test]
fn csv_tables_have_headers_and_sequential_row_ids() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut sink = CsvSink::open(dir.path()).unwrap();
        sink.append_screening(&screening(1)).unwrap();
        sink.append_trial(&trial(1, 1, true)).unwrap();
    }
    // a second run picks up where the file left off
    let mut sink = CsvSink::open(dir.path()).unwrap();
    sink.append_screening(&screening(2)).unwrap();

    let text = std::fs::read_to_string(sink.screening_path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,participant_id,handedness,mouse_usage_hours,timestamp"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,1,right,3–8 Hours,"));
    assert!(lines[2].starts_with("2,2,right,3–8 Hours,"));

    let trials = std::fs::read_to_string(sink.trial_path()).unwrap();
    assert!(trials.lines().nth(1).unwrap().starts_with("1,1,1,40,100,left,"));
    let summaries = std::fs::read_to_string(sink.summary_path()).unwrap();
    assert_eq!(summaries.lines().count(), 1);
}

#[test]
fn csv_ignores_non_numeric_participant_ids() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ScreeningInfo.csv"),
        "id,participant_id,handedness,mouse_usage_hours,timestamp\n1,abc,left,8+ Hours,x\n2,4,left,8+ Hours,y\n",
    )
    .unwrap();
    let mut sink = CsvSink::open(dir.path()).unwrap();
    assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(5));
}

#[test]
fn storage_config_opens_each_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StorageConfig {
        sqlite_path: dir.path().join("fitts.db"),
        csv_dir: dir.path().join("csv"),
        ..StorageConfig::default()
    };
    for mode in [StorageMode::Sqlite, StorageMode::Csv, StorageMode::Memory] {
        config.mode = mode;
        let mut sink = config.open_sink().unwrap();
        assert_eq!(sink.next_participant_id().unwrap(), ParticipantId(1));
    }
    assert!(dir.path().join("fitts.db").exists());
    assert!(dir.path().join("csv").join("TrialData.csv").exists());
    assert_eq!("db".parse::<StorageMode>(), Ok(StorageMode::Sqlite));
    assert!("excel".parse::<StorageMode>().is_err());
}

#[test]
fn export_writes_both_sheets_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let trials = vec![trial(1, 1, false), trial(1, 1, true)];
    let summaries = vec![summary(1)];

    let book = export_workbook(&dir.path().join("export"), &trials, &summaries).unwrap();

    let sheet = std::fs::read_to_string(&book.trial_sheet).unwrap();
    assert!(sheet.starts_with("Participant ID,Trial,Diameter,Distance,Direction,Task Time"));
    assert_eq!(sheet.lines().count(), 3);
    let sheet = std::fs::read_to_string(&book.summary_sheet).unwrap();
    assert!(sheet.contains("Accuracy (%)"));
    assert!(sheet.lines().nth(1).unwrap().starts_with("1,34.5,1,1,50"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&book.session_json).unwrap()).unwrap();
    assert_eq!(json["trials"].as_array().unwrap().len(), 2);
    assert_eq!(json["summaries"][0]["accuracy_percentage"], 50.0);
}
