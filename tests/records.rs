use std::fs;

use almighty_quiz::quiz::grading::{grade, Submission};
use almighty_quiz::results::ResultLog;
use almighty_quiz::storage::record::RecordId;
use almighty_quiz::{FileStorage, QuestionBank, QuizError, ResultStore};

const CATALOG: &str = r#"[
    {
        "text": "Which of these are planets?",
        "kind": "multi",
        "policy": "all_required",
        "options": ["Pluto", "Mercury", "Mars", "Sun"],
        "correct": [1, 2]
    },
    {
        "text": "What is the capital of New Zealand?",
        "kind": "free_text",
        "policy": "all_required",
        "options": ["Wellington"],
        "correct": [0]
    }
]"#;

fn store(root: &std::path::Path) -> ResultStore<FileStorage> {
    ResultStore::new(FileStorage, root)
}

#[tokio::test]
async fn records_are_listed_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let user_dir = dir.path().join("alice");
    fs::create_dir_all(&user_dir).unwrap();
    for name in [
        "1_1_2023-0_0_0.sav",
        "31_12_2022-23_59_59.sav",
        "5_1_2023-9_0_0.sav",
        "notes.txt",
    ] {
        fs::write(user_dir.join(name), "[]").unwrap();
    }

    let records = store(dir.path()).list("alice").await.unwrap();
    let names: Vec<String> = records.iter().map(|record| record.id.to_string()).collect();
    assert_eq!(names, ["5_1_2023-9_0_0", "1_1_2023-0_0_0", "31_12_2022-23_59_59"]);
    assert_eq!(records[0].label, "05/01/2023 - 09:00:00 AM");
}

#[tokio::test]
async fn saved_log_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    store.init().await.unwrap();

    let bank = QuestionBank::from_json(CATALOG).unwrap();
    let answers = [
        Submission::choices(["Mars", "Pluto"]),
        Submission::text("  wellington "),
    ];
    let mut log = ResultLog::new();
    for (question, submission) in bank.questions().iter().zip(&answers) {
        let given = submission.given_answers(question).unwrap();
        log.append(question, &grade(question, &given), &given);
    }

    let id: RecordId = "3_7_2023-14_5_9".parse().unwrap();
    store.save("alice", &log, id).await.unwrap();
    assert!(dir.path().join("alice").join("3_7_2023-14_5_9.sav").is_file());
    assert!(store.has_records("alice").await);

    let record = store.load("alice", &id).await.unwrap();
    assert_eq!(record.entries, log.entries());
    assert_eq!(record.score(), 1);
    assert!(!record.entries[0].is_correct);
    assert_eq!(record.entries[0].partial_answers, ["Mercury"]);
}

#[tokio::test]
async fn existing_record_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let user_dir = dir.path().join("alice");
    fs::create_dir_all(&user_dir).unwrap();
    fs::write(user_dir.join("3_7_2023-14_5_9.sav"), "kept").unwrap();

    let id: RecordId = "3_7_2023-14_5_9".parse().unwrap();
    let saved = store.save("alice", &ResultLog::new(), id).await.unwrap();

    assert_eq!(saved.to_string(), "3_7_2023-14_5_10");
    assert_eq!(fs::read_to_string(user_dir.join("3_7_2023-14_5_9.sav")).unwrap(), "kept");
    assert_eq!(store.list("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn user_without_folder_has_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    assert!(store.list("nobody").await.unwrap().is_empty());
    assert!(!store.has_records("nobody").await);
}

#[tokio::test]
async fn truncated_record_is_corrupted() {
    let dir = tempfile::tempdir().unwrap();
    let user_dir = dir.path().join("alice");
    fs::create_dir_all(&user_dir).unwrap();
    fs::write(
        user_dir.join("1_2_2023-3_4_5.sav"),
        r#"[["Which of these are planets?",2,false,["Pluto","Mercury"#,
    )
    .unwrap();

    let id = RecordId::from_file_name("1_2_2023-3_4_5.sav").unwrap();
    let err = store(dir.path()).load("alice", &id).await.unwrap_err();
    assert!(matches!(err, QuizError::DataCorruption { .. }), "{err}");
}

#[tokio::test]
async fn init_creates_nested_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data").join("AnF2023Quiz");
    store(&root).init().await.unwrap();
    assert!(root.is_dir());
}
