#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const SOURCE: &str = "\
Órgão ofertante,Turma,Código,Disciplina,Docente,Horário,Sala/Lab
CIn,A,CIN0130,SISTEMAS DIGITAIS,Ana,2M12 4M12,E112
CIn,B,CIN0130,SISTEMAS DIGITAIS,Ana,3T12 5T12,E112
CIn,A,CIN0131,ALGORITMOS,Bruno,2M23,E113
CIn,A,CIN0132,REDES,Carla,6N12,E114
";

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    selections: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("create temp dir");
    let source = dir.path().join("disciplinas.csv");
    let selections = dir.path().join("selecoes.json");
    fs::write(&source, SOURCE).unwrap();
    Fixture {
        _dir: dir,
        source,
        selections,
    }
}

#[allow(deprecated)]
fn run_cli(source: &Path, selections: &Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("planner").expect("planner binary");
    cmd.arg("--csv")
        .arg(source)
        .arg("--selections")
        .arg(selections)
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_adds_course_and_saves_selection() {
    let fx = fixture();
    run_cli(&fx.source, &fx.selections, "add code CIN0131\nquit\n")
        .success()
        .stdout(str_contains("'ALGORITMOS' (CIN0131) added to the schedule."));

    let saved = fs::read_to_string(&fx.selections).unwrap();
    assert_eq!(saved, "[\n  \"ALGORITMOS\"\n]");
}

#[test]
fn cli_reports_conflicts_and_refuses_add() {
    let fx = fixture();
    run_cli(
        &fx.source,
        &fx.selections,
        "add code CIN0130 1\nadd code CIN0131\nquit\n",
    )
    .success()
    .stdout(str_contains("Conflicts with 'SISTEMAS DIGITAIS' (CIN0130)"))
    .stdout(str_contains("Segunda Manhã 7:00"))
    .stdout(str_contains("Cannot add course because of schedule conflicts."));
}

#[test]
fn cli_asks_to_disambiguate_sections() {
    let fx = fixture();
    run_cli(&fx.source, &fx.selections, "add code CIN0130\nadd code CIN0130 5\nquit\n")
        .success()
        .stdout(str_contains("Found 2 matches."))
        .stdout(str_contains("Pick a section with 'add code CIN0130 <n>'."))
        .stdout(str_contains("Invalid index '5'"));
    assert!(!fx.selections.exists());
}

#[test]
fn cli_time_search_rejects_bad_code() {
    let fx = fixture();
    run_cli(&fx.source, &fx.selections, "search time 9Z1\nsearch time 2M12\nquit\n")
        .success()
        .stdout(str_contains("invalid time code '9Z1'"))
        .stdout(str_contains("Courses available on Segunda (Manhã) at: 6:00, 7:00"));
}

#[test]
fn cli_schedule_shows_grid() {
    let fx = fixture();
    run_cli(
        &fx.source,
        &fx.selections,
        "add code CIN0132\nschedule\nremove code CIN0132\nschedule\nquit\n",
    )
    .success()
    .stdout(str_contains("Weekly schedule:"))
    .stdout(str_contains("18:50"))
    .stdout(str_contains("'REDES' (CIN0132) removed from the schedule."))
    .stdout(str_contains("No courses selected."));
}

#[test]
fn cli_keeps_selection_between_runs() {
    let fx = fixture();
    run_cli(&fx.source, &fx.selections, "add name redes\nquit\n").success();
    run_cli(&fx.source, &fx.selections, "selected\nquit\n")
        .success()
        .stdout(str_contains("1 selected"))
        .stdout(str_contains("Selecionada"));
}

#[test]
#[cfg(feature = "sqlite")]
#[allow(deprecated)]
fn cli_sqlite_store_tolerates_foreign_selection_file() {
    let fx = fixture();
    fs::write(&fx.selections, "[\"REDES\"]").unwrap();

    Command::cargo_bin("planner")
        .expect("planner binary")
        .arg("--csv")
        .arg(&fx.source)
        .arg("--selections")
        .arg(&fx.selections)
        .arg("--store")
        .arg("sqlite")
        .write_stdin("list\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("4 courses loaded, 0 selected"))
        .stdout(str_contains("ALGORITMOS"));
}

#[test]
fn cli_formats_raw_export_from_prompt() {
    let fx = fixture();
    let dir = fx.source.parent().unwrap().to_path_buf();
    let raw = dir.join("raw.csv");
    let out = dir.join("novas.csv");
    fs::write(
        &raw,
        "Órgão ofertante,Turma,Disciplina,Docente,Horário\nCIn,A,CIN0140 - COMPILADORES,Davi,ter. 14:00-15:50 (E120)\n",
    )
    .unwrap();

    let script = format!("format {} {}\nformat\nquit\n", raw.display(), out.display());
    run_cli(&fx.source, &fx.selections, &script)
        .success()
        .stdout(str_contains("Wrote 1 courses"))
        .stdout(str_contains("Usage: format <raw> <out>"));

    let formatted = fs::read_to_string(&out).unwrap();
    assert!(formatted.contains("CIN0140,COMPILADORES,Davi,3T34,E120"));
}

#[test]
fn cli_exits_when_source_is_missing() {
    let dir = tempdir().unwrap();
    run_cli(
        &dir.path().join("missing.csv"),
        &dir.path().join("selecoes.json"),
        "quit\n",
    )
    .failure()
    .stderr(str_contains("course data file not found"));
}

#[test]
#[allow(deprecated)]
fn cli_formats_raw_export() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let out = dir.path().join("disciplinas.csv");
    fs::write(
        &raw,
        "Órgão ofertante,Turma,Disciplina,Docente,Horário\nCIn,A,CIN0130 - SISTEMAS DIGITAIS,Ana,seg. 08:00-09:50 (E112)\n",
    )
    .unwrap();

    Command::cargo_bin("planner")
        .expect("planner binary")
        .arg("format")
        .arg(&raw)
        .arg(&out)
        .assert()
        .success()
        .stdout(str_contains("Wrote 1 courses"));

    let formatted = fs::read_to_string(&out).unwrap();
    assert!(formatted.contains("CIN0130,SISTEMAS DIGITAIS,Ana,2M34,E112"));
}
