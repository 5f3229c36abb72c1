use assert_cmd::Command;
use hubtrail::lineage::{Direction, LineageStore};
use hubtrail::normalize::Properties;

fn hubtrail() -> Command {
    let mut cmd = Command::cargo_bin("hubtrail").unwrap();
    cmd.env_remove("HUBTRAIL_STORE").env_remove("HF_TOKEN");
    cmd
}

#[test]
fn runs() {
    hubtrail().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = hubtrail();
    cmd.arg("-V");
    cmd.assert().success().stdout("hubtrail 0.1.0\n");
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = hubtrail();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("ingest"))
        .stdout(predicates::str::contains("ingest-model"))
        .stdout(predicates::str::contains("catalog"))
        .stdout(predicates::str::contains("artifacts"));
}

#[test]
fn ingest_requires_a_task() {
    let mut cmd = hubtrail();
    cmd.arg("ingest");
    cmd.assert().failure();
}

#[test]
fn ingest_model_requires_task_and_model() {
    let mut cmd = hubtrail();
    cmd.args(["ingest-model", "text-classification"]);
    cmd.assert().failure();
}

#[test]
fn ingest_model_rejects_invalid_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("mlmd.sqlite");

    let mut cmd = hubtrail();
    cmd.args(["ingest-model", "text-classification", "../escape"])
        .arg("--store")
        .arg(&store);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid hub reference"));
}

#[test]
fn ingest_model_rejects_dataset_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("mlmd.sqlite");

    let mut cmd = hubtrail();
    cmd.args([
        "ingest-model",
        "question-answering",
        "https://huggingface.co/datasets/org/squad",
    ])
    .arg("--store")
    .arg(&store);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("expected a model reference"));
}

#[test]
fn ingest_model_rejects_conflicting_revision() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("mlmd.sqlite");

    let mut cmd = hubtrail();
    cmd.args([
        "ingest-model",
        "text-generation",
        "https://huggingface.co/org/model/tree/v1",
        "--revision",
        "v2",
    ])
    .arg("--store")
    .arg(&store);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("conflicting revisions"));
}

#[test]
fn ingest_rejects_unknown_output_format() {
    let mut cmd = hubtrail();
    cmd.args(["ingest", "text-classification", "--output", "yaml"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported output format"));
}

#[test]
fn artifacts_on_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("mlmd.sqlite");

    let mut cmd = hubtrail();
    cmd.arg("artifacts").arg("--store").arg(&store);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("No artifacts recorded"));
}

#[test]
fn artifacts_lists_recorded_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mlmd.sqlite");
    {
        let store = LineageStore::open(&path).expect("open");
        let session = store
            .create_session("text-classification", "bert-base", "bert-base")
            .expect("session");
        session
            .log_model("models/bert-base", Direction::Output, &Properties::new())
            .expect("log model");
        session
            .log_dataset("datasets/squad", Direction::Input, &Properties::new())
            .expect("log dataset");
        session.finalize().expect("finalize");
    }

    let mut cmd = hubtrail();
    cmd.arg("artifacts").arg("--store").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("models/bert-base"))
        .stdout(predicates::str::contains("datasets/squad"))
        .stdout(predicates::str::contains("2 artifact(s)"));

    let mut cmd = hubtrail();
    cmd.args(["artifacts", "--output", "json"])
        .arg("--store")
        .arg(&path);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"uri\": \"models/bert-base\""))
        .stdout(predicates::str::contains("\"kind\": \"dataset\""));
}

#[test]
fn store_path_can_come_from_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = dir.path().join("from-env.sqlite");

    let mut cmd = Command::cargo_bin("hubtrail").unwrap();
    cmd.env("HUBTRAIL_STORE", &store).arg("artifacts");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("from-env.sqlite"));
    assert!(store.exists());
}
