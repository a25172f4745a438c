use assert_cmd::Command;
use predicates::prelude::*;

fn onemore() -> Command {
    Command::cargo_bin("onemore").unwrap()
}

#[test]
fn list_shows_builtin_encounters() {
    onemore()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("shadow_ambush"))
        .stdout(predicate::str::contains("gatekeeper"));
}

#[test]
fn run_prints_the_battle_log() {
    onemore()
        .args(["run", "--encounter", "shadow_ambush", "--seed", "5"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[ROUND] 1"))
        .stdout(predicate::str::contains("[END] "))
        .stdout(predicate::str::contains("outcome="));
}

#[test]
fn many_reports_a_summary() {
    onemore()
        .args(["many", "--encounter", "gatekeeper", "--samples", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("samples=5"))
        .stdout(predicate::str::contains("escapes=0"));
}

#[test]
fn encounter_files_may_carry_a_bom() {
    let yaml = "\u{feff}name: Sparring
party:
  - { id: joker, name: Joker, max_hp: 100, stats: { attack: 200, speed: 20 } }
enemies:
  - { id: dummy, name: Dummy, max_hp: 50, stats: { attack: 1, speed: 1 } }
";
    let path = std::env::temp_dir().join(format!("onemore-bom-{}.yaml", std::process::id()));
    std::fs::write(&path, yaml).unwrap();

    onemore()
        .arg("run")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("outcome=victory"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_source_is_an_error() {
    onemore()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--encounter"));
}

#[test]
fn unknown_encounter_fails() {
    onemore()
        .args(["dump", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown built-in encounter"));
}
