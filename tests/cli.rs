use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn cardgift(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cardgift").unwrap();
    cmd.env("CARDGIFT_DATA", data_dir)
        .env_remove("CARDGIFT_BASE_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn save_then_get_roundtrip() {
    let temp_dir = tempfile::tempdir().unwrap();

    cardgift(temp_dir.path())
        .args(["save", "c1", "--text", "Happy Birthday!\nEnjoy", "--user", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved card"))
        .stdout(predicate::str::contains("/api/save-card?id=c1"));

    let view = json_output(cardgift(temp_dir.path()).args(["get", "c1", "-o", "json"]));
    assert_eq!(view["title"], "Happy Birthday!");
    assert_eq!(view["userId"], "u1");
    assert_eq!(view["views"], 0);
    assert!(temp_dir.path().join("cards.json").exists());
}

#[test]
fn save_without_id_generates_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let receipt = json_output(cardgift(temp_dir.path()).args(["save", "--text", "Hi", "-o", "json"]));
    let card_id = receipt["cardId"].as_str().unwrap();
    assert!(card_id.starts_with("card_"));
}

#[test]
fn view_and_click_are_counted() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["save", "c1", "--text", "Hi"])
        .assert()
        .success();

    for _ in 0..3 {
        cardgift(temp_dir.path()).args(["view", "c1"]).assert().success();
    }
    cardgift(temp_dir.path()).args(["click", "c1"]).assert().success();

    let view = json_output(cardgift(temp_dir.path()).args(["get", "c1", "-o", "json"]));
    assert_eq!(view["views"], 3);
    assert_eq!(view["clicks"], 1);
}

#[test]
fn unknown_card_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["get", "missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Card not found: missing"));

    cardgift(temp_dir.path())
        .args(["view", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
    assert!(!temp_dir.path().join("cards.json").exists());
}

#[test]
fn blank_greeting_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["save", "c1", "--text", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
}

#[test]
fn list_is_scoped_to_requester() {
    let temp_dir = tempfile::tempdir().unwrap();
    for (id, user) in [("a1", "alice"), ("a2", "alice"), ("b1", "bob")] {
        cardgift(temp_dir.path())
            .args(["save", id, "--text", "Hello", "--user", user])
            .assert()
            .success();
    }

    let page = json_output(cardgift(temp_dir.path()).args(["list", "--user", "alice", "-o", "json"]));
    assert_eq!(page["total"], 2);
    let owners: Vec<_> = page["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["userId"].as_str().unwrap().to_string())
        .collect();
    assert!(owners.iter().all(|u| u == "alice"));

    let page = json_output(cardgift(temp_dir.path()).args([
        "list", "--user", "root", "--level", "6", "-o", "json",
    ]));
    assert_eq!(page["total"], 3);
}

#[test]
fn list_text_output_shows_titles() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["save", "c1", "--text", "Season's greetings\nfrom us", "--user", "u1"])
        .assert()
        .success();

    cardgift(temp_dir.path())
        .args(["list", "--user", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Season&#x27;s greetings"))
        .stdout(predicate::str::contains("1 of 1 cards"));

    cardgift(temp_dir.path())
        .args(["list", "--user", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cards found."));
}

#[test]
fn founder_wallet_from_config_sees_everything() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("config.json"),
        r#"{ "founders": { "authors": ["0xABCDEF"] } }"#,
    )
    .unwrap();
    for (id, user) in [("a1", "alice"), ("b1", "bob")] {
        cardgift(temp_dir.path())
            .args(["save", id, "--text", "Hello", "--user", user])
            .assert()
            .success();
    }

    let page = json_output(cardgift(temp_dir.path()).args([
        "list", "--wallet", "0xabcdef", "-o", "json",
    ]));
    assert_eq!(page["total"], 2);
}

#[test]
fn config_base_url_changes_links() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["config", "base-url", "https://cards.example/"])
        .assert()
        .success();

    cardgift(temp_dir.path())
        .args(["config", "base-url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base-url = https://cards.example"));

    let receipt = json_output(cardgift(temp_dir.path()).args(["save", "c1", "--text", "Hi", "-o", "json"]));
    assert_eq!(
        receipt["shareUrl"],
        "https://cards.example/api/save-card?id=c1"
    );
}

#[test]
fn base_url_env_overrides_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let receipt = json_output(
        cardgift(temp_dir.path())
            .env("CARDGIFT_BASE_URL", "https://env.example")
            .args(["save", "c1", "--text", "Hi", "-o", "json"]),
    );
    assert_eq!(
        receipt["previewUrl"],
        "https://env.example/api/og-image?id=c1"
    );
}

#[test]
fn unknown_config_key_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["config", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key: colour"));
}

#[test]
fn save_without_text_updates_existing_card() {
    let temp_dir = tempfile::tempdir().unwrap();
    cardgift(temp_dir.path())
        .args(["save", "c1", "--text", "Hello", "--user", "u1"])
        .assert()
        .success();

    cardgift(temp_dir.path())
        .args(["save", "c1", "--style", "space"])
        .assert()
        .success();

    let view = json_output(cardgift(temp_dir.path()).args(["get", "c1", "-o", "json"]));
    assert_eq!(view["greetingText"], "Hello");
    assert_eq!(view["style"], "space");

    cardgift(temp_dir.path())
        .args(["save", "c2", "--style", "space"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greetingText"));
}

#[test]
fn config_set_with_json_output_is_parseable() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = json_output(cardgift(temp_dir.path()).args([
        "config", "page-size", "5", "-o", "json",
    ]));
    assert_eq!(config["defaultPageSize"], 5);
}
