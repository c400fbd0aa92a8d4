use study_planner::{
    CannedAdvisor, Database, ErrorKind, MonthlyDataPatch, NewTask, Planner, PlannerDefaults, Snapshot,
};

fn setup_planner() -> Planner<Database> {
    Planner::open(Database::open_in_memory().unwrap(), PlannerDefaults::default()).unwrap()
}

#[test]
fn test_conflict_then_force_then_completion() {
    let mut planner = setup_planner();

    let math = planner
        .add_task(NewTask::new("Math", "2024-05-10", "09:00", 60).with_type("공부"))
        .unwrap();

    let english = NewTask::new("English", "2024-05-10", "09:30", 30).with_type("공부");
    let err = planner.add_task(english.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchedulingConflict);

    let forced = planner.force_add_task(english).unwrap();
    assert_ne!(forced.id, math.id);

    let day = planner.list_by_date("2024-05-10");
    let starts: Vec<&str> = day.iter().map(|t| t.start_time.as_str()).collect();
    assert_eq!(starts, ["09:00", "09:30"]);

    planner.toggle_task(day[0].id).unwrap();
    assert_eq!(planner.completion_rate("2024-05"), 50.0);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.db");
    let path = path.to_str().unwrap();

    let task_id = {
        let mut planner = Planner::open(Database::new(path).unwrap(), PlannerDefaults::default()).unwrap();
        planner.add_type("음악").unwrap();
        planner.save_feedback("2024-05-10", 7, "ok").unwrap();
        planner
            .add_task(NewTask::new("Piano", "2024-05-10", "18:00", 45).with_type("음악"))
            .unwrap()
            .id
    };

    let planner = Planner::open(Database::new(path).unwrap(), PlannerDefaults::default()).unwrap();
    assert_eq!(planner.get_task(task_id).unwrap().task_type, "음악");
    assert!(planner.task_types().iter().any(|t| t == "음악"));
    assert_eq!(planner.get_feedback("2024-05-10").unwrap().mood_score, 7);
}

#[test]
fn test_backup_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let backup_path = dir.path().join(Snapshot::default_file_name(
        chrono::NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
    ));

    let mut source = setup_planner();
    let task = source
        .add_task(NewTask::new("Math", "2024-05-10", "09:00", 60).with_type("공부"))
        .unwrap();
    source.toggle_task(task.id).unwrap();
    source
        .add_task(NewTask::new("Run", "2024-05-11", "07:00", 30).with_type("운동"))
        .unwrap();
    source.add_type("음악").unwrap();
    source.delete_type("휴식").unwrap();
    source.set_default_type("운동").unwrap();
    source.save_feedback("2024-05-10", 9, "productive").unwrap();
    source
        .update_monthly_data(
            "2024-05",
            MonthlyDataPatch {
                keyword: Some("finals".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    source.generate_report("2024-05", &CannedAdvisor).unwrap();
    source.write_backup(&backup_path).unwrap();

    let mut restored = setup_planner();
    restored
        .add_task(NewTask::new("Stale", "2023-01-01", "10:00", 10))
        .unwrap();
    restored.read_backup(&backup_path).unwrap();

    assert_eq!(restored.tasks(), source.tasks());
    assert_eq!(restored.feedbacks(), source.feedbacks());
    assert_eq!(restored.task_types(), source.task_types());
    assert_eq!(restored.default_task_type(), "운동");
    assert_eq!(restored.monthly(), source.monthly());
    assert_eq!(restored.export_snapshot().unwrap(), source.export_snapshot().unwrap());
    assert_eq!(restored.monthly_summary("2024-05"), source.monthly_summary("2024-05"));
}

#[test]
fn test_reads_blobs_written_by_the_web_version() {
    let db = Database::open_in_memory().unwrap();
    let snapshot = Snapshot {
        tasks: Some(
            r##"[{"id":1715302800000.4213,"title":"[공부] Math","description":"","date":"2024-05-10",
                "startTime":"09:00","duration":60,"isCompleted":true,"color":"#FFB6C1","type":"공부"}]"##
                .to_string(),
        ),
        feedbacks: Some(
            r#"{"2024-05-10":{"date":"2024-05-10","mood":"Happy","moodScore":9,"content":"good"}}"#.to_string(),
        ),
        types: Some(r#"["공부","운동"]"#.to_string()),
        default_type: Some("운동".to_string()),
        monthly: Some(r#"{"2024-05":{"keyword":"finals","memo":"","personalFeedback":""}}"#.to_string()),
    };

    let mut planner = Planner::open(db, PlannerDefaults::default()).unwrap();
    planner.import_snapshot(snapshot).unwrap();

    let imported = planner.list_by_date("2024-05-10")[0].clone();
    assert_eq!(imported.id, 1_715_302_800_000_421);
    assert_eq!(imported.display_title(), "Math");
    assert_eq!(planner.completion_rate("2024-05"), 100.0);
    assert_eq!(planner.average_mood_score("2024-05"), 9.0);
    assert_eq!(planner.task_types(), ["공부", "운동"]);
    assert_eq!(planner.monthly_data("2024-05").unwrap().keyword, "finals");

    // ids survive a write back and stay addressable
    planner.toggle_task(imported.id).unwrap();
    assert!(!planner.get_task(imported.id).unwrap().is_completed);
    planner.reload().unwrap();
    assert_eq!(planner.tasks()[0].id, imported.id);
}
