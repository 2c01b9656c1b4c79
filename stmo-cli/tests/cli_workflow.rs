use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;
use tiny_http::{Method, Response, Server};

const POC_SQL: &str = "SELECT submission_date, count(*)\nFROM main_summary\nGROUP BY 1\n";

// ---------------------------------------------------------------------------
// Fake Redash
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeState {
    queries: BTreeMap<u64, Value>,
    rejected_updates: BTreeSet<u64>,
    updates: Vec<(u64, Value)>,
}

struct FakeRedash {
    base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeRedash {
    fn start(queries: &[(u64, &str, &str)]) -> Self {
        let mut state = FakeState::default();
        for (id, name, sql) in queries {
            state.queries.insert(
                *id,
                json!({
                    "id": id,
                    "name": name,
                    "description": null,
                    "query": sql,
                    "data_source_id": 1,
                    "schedule": null,
                    "options": { "parameters": [] },
                }),
            );
        }
        let state = Arc::new(Mutex::new(state));

        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let (status, payload) = route(&shared, request.method(), request.url(), &body);
                let _ = request.respond(Response::from_string(payload).with_status_code(status));
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    fn reject_updates_to(&self, id: u64) {
        self.state.lock().unwrap().rejected_updates.insert(id);
    }

    fn updates(&self) -> Vec<(u64, Value)> {
        self.state.lock().unwrap().updates.clone()
    }

    fn remote_sql(&self, id: u64) -> String {
        self.state.lock().unwrap().queries[&id]["query"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn set_remote_sql(&self, id: u64, sql: &str) {
        self.state.lock().unwrap().queries.get_mut(&id).unwrap()["query"] = json!(sql);
    }

    fn query_count(&self) -> usize {
        self.state.lock().unwrap().queries.len()
    }

    fn drop_remote_sql(&self, id: u64) {
        if let Some(query) = self.state.lock().unwrap().queries.get_mut(&id) {
            query.as_object_mut().unwrap().remove("query");
        }
    }
}

fn route(state: &Mutex<FakeState>, method: &Method, url: &str, body: &str) -> (u16, String) {
    let mut state = state.lock().unwrap();
    let path = url.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let not_found = (404, json!({ "message": "Couldn't find resource." }).to_string());

    match (method, segments.as_slice()) {
        (Method::Get, ["api", "queries", id]) => {
            let Ok(id) = id.parse::<u64>() else { return not_found };
            match state.queries.get(&id) {
                Some(query) => (200, query.to_string()),
                None => not_found,
            }
        }
        (Method::Post, ["api", "queries", id]) => {
            let Ok(id) = id.parse::<u64>() else { return not_found };
            if state.rejected_updates.contains(&id) {
                return (500, "{}".into());
            }
            let update: Value = serde_json::from_str(body).unwrap_or(Value::Null);
            let Some(query) = state.queries.get_mut(&id) else { return not_found };
            query["query"] = update["query"].clone();
            let reply = query.to_string();
            state.updates.push((id, update));
            (200, reply)
        }
        (Method::Post, ["api", "queries", id, "fork"]) => {
            let Ok(id) = id.parse::<u64>() else { return not_found };
            let Some(source) = state.queries.get(&id).cloned() else { return not_found };
            let new_id = state.queries.keys().max().copied().unwrap_or(0) + 1;
            let mut fork = source;
            fork["id"] = json!(new_id);
            fork["name"] = json!(format!("Copy of (#{id}) {}", fork["name"].as_str().unwrap_or("")));
            state.queries.insert(new_id, fork.clone());
            (200, fork.to_string())
        }
        (Method::Post, ["api", "query_results"]) => {
            let payload = json!({
                "query_result": {
                    "data": {
                        "columns": [{ "name": "day" }, { "name": "clients" }],
                        "rows": [
                            { "day": "2017-01-01", "clients": 10 },
                            { "day": "2017-01-02", "clients": 12 },
                        ],
                    },
                },
            });
            (200, payload.to_string())
        }
        _ => not_found,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stmocli(workdir: &Path, base_url: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stmocli"));
    cmd.current_dir(workdir)
        .env("REDASH_API_KEY", "TOTALLY_FAKE_KEY")
        .env("STMOCLI_BASE_URL", base_url)
        .env_remove("STMOCLI_REGISTRY")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run stmocli");
    String::from_utf8(output.stdout).expect("stdout utf8")
}

fn md5_hex(content: &str) -> String {
    stmo_sync::checksum(content)
}

fn setup(queries: &[(u64, &str, &str)]) -> (TempDir, FakeRedash) {
    let dir = TempDir::new().expect("workdir");
    let redash = FakeRedash::start(queries);
    stmocli(dir.path(), &redash.base_url)
        .arg("init")
        .assert()
        .success();
    (dir, redash)
}

fn track(dir: &TempDir, redash: &FakeRedash, id: u64, file: &str) {
    stmocli(dir.path(), &redash.base_url)
        .args(["track", &id.to_string(), file])
        .assert()
        .success();
}

fn registry(dir: &TempDir) -> Value {
    let raw = fs::read_to_string(dir.path().join(".stmocli.conf")).expect("registry");
    serde_json::from_str(&raw).expect("registry json")
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_empty_registry_once() {
    let dir = TempDir::new().unwrap();
    let base = "http://127.0.0.1:9";

    stmocli(dir.path(), base)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialized"));
    assert_eq!(
        fs::read_to_string(dir.path().join(".stmocli.conf")).unwrap(),
        "{}\n"
    );

    fs::write(dir.path().join(".stmocli.conf"), "{\"keep\": {\"id\": \"1\"}}").unwrap();
    stmocli(dir.path(), base)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("already exists"));
    assert_eq!(
        fs::read_to_string(dir.path().join(".stmocli.conf")).unwrap(),
        "{\"keep\": {\"id\": \"1\"}}"
    );
}

#[test]
fn registry_flag_moves_the_store() {
    let dir = TempDir::new().unwrap();
    stmocli(dir.path(), "http://127.0.0.1:9")
        .args(["--registry", "custom.json", "init"])
        .assert()
        .success();
    assert!(dir.path().join("custom.json").exists());
    assert!(!dir.path().join(".stmocli.conf").exists());
}

// ---------------------------------------------------------------------------
// track
// ---------------------------------------------------------------------------

#[test]
fn track_prompts_for_file_name_and_accepts_default() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .args(["track", "49741"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(contains("[poc.sql]"))
        .stdout(contains("Tracking query 49741"));

    assert_eq!(fs::read_to_string(dir.path().join("poc.sql")).unwrap(), POC_SQL);
    let stored = registry(&dir);
    assert_eq!(stored["poc.sql"]["id"], "49741");
    assert_eq!(stored["poc.sql"]["name"], "POC");
    assert_eq!(stored["poc.sql"]["data_source_id"], 1);
}

#[test]
fn track_prompt_answer_overrides_default() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .args(["track", "49741"])
        .write_stdin("mine.sql\n")
        .assert()
        .success();

    assert!(dir.path().join("mine.sql").exists());
    assert!(!dir.path().join("poc.sql").exists());
    assert!(registry(&dir).get("mine.sql").is_some());
}

#[test]
fn track_missing_query_fails_without_writing() {
    let (dir, redash) = setup(&[]);

    stmocli(dir.path(), &redash.base_url)
        .args(["track", "99999", "ghost.sql"])
        .assert()
        .failure()
        .stderr(contains("404"));

    assert!(!dir.path().join("ghost.sql").exists());
    assert_eq!(registry(&dir), json!({}));
}

#[test]
fn track_existing_file_keeps_first_entry() {
    let (dir, redash) = setup(&[(1, "First", "SELECT 1"), (2, "Second", "SELECT 2")]);
    track(&dir, &redash, 1, "shared.sql");

    stmocli(dir.path(), &redash.base_url)
        .args(["track", "2", "shared.sql"])
        .assert()
        .success()
        .stderr(contains("already tracked as query 1"));

    assert_eq!(registry(&dir)["shared.sql"]["id"], "1");
}

#[test]
fn track_rejects_non_numeric_ids() {
    let (dir, redash) = setup(&[(1, "First", "SELECT 1")]);

    for raw in ["1/fork", "1#x"] {
        stmocli(dir.path(), &redash.base_url)
            .args(["track", raw, "odd.sql"])
            .assert()
            .failure()
            .stderr(contains("not a query id"));
    }

    assert!(!dir.path().join("odd.sql").exists());
    assert_eq!(registry(&dir), json!({}));
    assert_eq!(redash.query_count(), 1);
}

#[test]
fn remote_commands_need_an_api_key() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .env_remove("REDASH_API_KEY")
        .args(["track", "49741", "poc.sql"])
        .assert()
        .failure()
        .stderr(contains("REDASH_API_KEY"));
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

#[test]
fn push_reports_checksum_and_updates_remote() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");
    let edited = format!("{POC_SQL}-- reviewed\n");
    fs::write(dir.path().join("poc.sql"), &edited).unwrap();
    let registry_before = fs::read(dir.path().join(".stmocli.conf")).unwrap();

    stmocli(dir.path(), &redash.base_url)
        .args(["push", "poc.sql"])
        .assert()
        .success()
        .stdout(contains(format!(
            "Query ID 49741 updated with content from poc.sql (md5 {})",
            md5_hex(&edited)
        )));

    assert_eq!(redash.remote_sql(49741), edited);
    let updates = redash.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1["name"], "POC");
    assert_eq!(updates[0].1["data_source_id"], 1);
    assert_eq!(
        fs::read(dir.path().join(".stmocli.conf")).unwrap(),
        registry_before
    );
}

#[test]
fn push_rejected_by_service_exits_nonzero() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");
    fs::write(dir.path().join("poc.sql"), "SELECT 2").unwrap();
    redash.reject_updates_to(49741);

    stmocli(dir.path(), &redash.base_url)
        .args(["push", "poc.sql"])
        .assert()
        .failure()
        .stderr(contains("Failed to update query from poc.sql"))
        .stderr(contains("500"));

    assert_eq!(fs::read_to_string(dir.path().join("poc.sql")).unwrap(), "SELECT 2");
    assert_eq!(redash.remote_sql(49741), POC_SQL);
}

#[test]
fn push_untracked_file_is_reported() {
    let (dir, redash) = setup(&[]);
    fs::write(dir.path().join("loose.sql"), "SELECT 1").unwrap();

    stmocli(dir.path(), &redash.base_url)
        .args(["push", "loose.sql"])
        .assert()
        .failure()
        .stderr(contains("Failed to update query from loose.sql"))
        .stderr(contains("track it first"));
    assert!(redash.updates().is_empty());
}

#[test]
fn push_without_arguments_pushes_everything() {
    let (dir, redash) = setup(&[
        (1, "First", "SELECT 1"),
        (2, "Second", "SELECT 2"),
        (3, "Third", "SELECT 3"),
    ]);
    for (id, file) in [(1, "first.sql"), (2, "second.sql"), (3, "third.sql")] {
        track(&dir, &redash, id, file);
    }

    let stdout = stdout_of(stmocli(dir.path(), &redash.base_url).arg("push"));
    let lines: BTreeSet<String> = stdout.lines().map(str::to_string).collect();
    let expected: BTreeSet<String> = [(1, "first.sql", "SELECT 1"), (2, "second.sql", "SELECT 2"), (3, "third.sql", "SELECT 3")]
        .into_iter()
        .map(|(id, file, sql)| {
            format!(
                "Query ID {id} updated with content from {file} (md5 {})",
                md5_hex(sql)
            )
        })
        .collect();

    assert_eq!(lines, expected);
    assert_eq!(redash.updates().len(), 3);
}

// ---------------------------------------------------------------------------
// pull
// ---------------------------------------------------------------------------

#[test]
fn pull_overwrites_local_edits() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");
    fs::write(dir.path().join("poc.sql"), "-- local draft").unwrap();
    redash.set_remote_sql(49741, "SELECT 42\n");

    stmocli(dir.path(), &redash.base_url)
        .args(["pull", "poc.sql"])
        .assert()
        .success()
        .stderr(contains("overwritten"));

    assert_eq!(fs::read_to_string(dir.path().join("poc.sql")).unwrap(), "SELECT 42\n");
}

#[test]
fn pull_of_response_without_sql_keeps_local_file() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");
    fs::write(dir.path().join("poc.sql"), "-- local draft").unwrap();
    let registry_before = fs::read(dir.path().join(".stmocli.conf")).unwrap();
    redash.drop_remote_sql(49741);

    stmocli(dir.path(), &redash.base_url)
        .args(["pull", "poc.sql"])
        .assert()
        .failure()
        .stderr(contains("no query text"));

    assert_eq!(fs::read_to_string(dir.path().join("poc.sql")).unwrap(), "-- local draft");
    assert_eq!(
        fs::read(dir.path().join(".stmocli.conf")).unwrap(),
        registry_before
    );
}

#[test]
fn pull_untracked_file_fails() {
    let (dir, redash) = setup(&[]);
    stmocli(dir.path(), &redash.base_url)
        .args(["pull", "nope.sql"])
        .assert()
        .failure()
        .stderr(contains("nope.sql"));
}

// ---------------------------------------------------------------------------
// fork
// ---------------------------------------------------------------------------

#[test]
fn fork_tracked_file_tracks_the_copy() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");

    stmocli(dir.path(), &redash.base_url)
        .args(["fork", "poc.sql", "poc_v2.sql"])
        .assert()
        .success()
        .stdout(contains("to query 49742"));

    assert_eq!(fs::read_to_string(dir.path().join("poc_v2.sql")).unwrap(), POC_SQL);
    let stored = registry(&dir);
    assert_eq!(stored["poc_v2.sql"]["id"], "49742");
    assert_eq!(stored["poc.sql"]["id"], "49741");
}

#[test]
fn fork_missing_source_leaves_nothing_behind() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .args(["fork", "99999", "forked.sql"])
        .assert()
        .failure()
        .stderr(contains("404"));

    assert!(!dir.path().join("forked.sql").exists());
    assert_eq!(registry(&dir), json!({}));
}

#[test]
fn fork_rejects_unknown_non_numeric_source() {
    let (dir, redash) = setup(&[]);
    stmocli(dir.path(), &redash.base_url)
        .args(["fork", "unknown.sql", "copy.sql"])
        .assert()
        .failure()
        .stderr(contains("neither a tracked file nor a query id"));
}

// ---------------------------------------------------------------------------
// view / list / write_csv
// ---------------------------------------------------------------------------

#[test]
fn view_prints_query_url() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);
    track(&dir, &redash, 49741, "poc.sql");

    stmocli(dir.path(), &redash.base_url)
        .args(["view", "poc.sql"])
        .assert()
        .success()
        .stdout(contains(format!("{}/queries/49741", redash.base_url)));
}

#[test]
fn list_shows_tracked_files() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL), (7, "Daily", "SELECT 7")]);

    stmocli(dir.path(), &redash.base_url)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No queries tracked"));

    track(&dir, &redash, 49741, "poc.sql");
    track(&dir, &redash, 7, "daily.sql");

    stmocli(dir.path(), &redash.base_url)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("poc.sql"))
        .stdout(contains("49741"))
        .stdout(contains("daily.sql"))
        .stdout(contains("2 queries tracked"));
}

#[test]
fn write_csv_to_stdout() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .args(["write_csv", "49741", "-"])
        .assert()
        .success()
        .stdout("day,clients\n2017-01-01,10\n2017-01-02,12\n");
}

#[test]
fn write_csv_default_file_name() {
    let (dir, redash) = setup(&[(49741, "POC", POC_SQL)]);

    stmocli(dir.path(), &redash.base_url)
        .args(["write_csv", "49741"])
        .assert()
        .success()
        .stdout(contains("poc.csv"));

    assert_eq!(
        fs::read_to_string(dir.path().join("poc.csv")).unwrap(),
        "day,clients\n2017-01-01,10\n2017-01-02,12\n"
    );
}
