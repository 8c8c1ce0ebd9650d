//! Integration tests for the shipyard binary.
//!
//! None of these reach the network: they exercise configuration, run
//! inspection and argument handling against temp project directories.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use shipyard::audit::RunLog;
use shipyard::pipeline::{Phase, PipelineState, StateManager};

/// Helper to create a shipyard Command with pipeline env cleared
fn shipyard() -> Command {
    let mut cmd = cargo_bin_cmd!("shipyard");
    cmd.env_remove("SHIPYARD_DRY_RUN")
        .env_remove("SHIPYARD_SKIP_DEPLOY")
        .env_remove("SHIPYARD_SKIP_ANNOUNCE")
        .env_remove("CLAUDE_CMD");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_config(dir: &TempDir, content: &str) {
    let shipyard_dir = dir.path().join(".shipyard");
    fs::create_dir_all(&shipyard_dir).unwrap();
    fs::write(shipyard_dir.join("shipyard.toml"), content).unwrap();
}

fn seed_run(dir: &TempDir, run_id: &str, edit: impl FnOnce(&mut PipelineState)) {
    let mut state = PipelineState::with_run_id(run_id);
    edit(&mut state);
    StateManager::new(dir.path().join(".shipyard/state"))
        .checkpoint(&state)
        .unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        shipyard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("status"));
    }

    #[test]
    fn test_version() {
        shipyard().arg("--version").assert().success();
    }

    #[test]
    fn test_run_help_lists_flags() {
        shipyard()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--dry-run"))
            .stdout(predicate::str::contains("--skip-deploy"))
            .stdout(predicate::str::contains("--timeframe"));
    }

    #[test]
    fn test_run_rejects_unknown_timeframe() {
        let dir = create_temp_project();
        shipyard()
            .current_dir(dir.path())
            .args(["run", "--timeframe", "hourly"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("hourly"));
    }

    #[test]
    fn test_unknown_command_fails() {
        shipyard().arg("launch").assert().failure();
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();

        shipyard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created shipyard.toml"));

        let path = dir.path().join(".shipyard/shipyard.toml");
        assert!(path.exists());
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("[budgets]"));
        assert!(content.contains("[judge]"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = create_temp_project();
        write_config(&dir, "[judge]\nmin_score = 70\n");

        shipyard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = fs::read_to_string(dir.path().join(".shipyard/shipyard.toml")).unwrap();
        assert!(content.contains("min_score = 70"));
    }

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        shipyard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No shipyard.toml found"))
            .stdout(predicate::str::contains("min_score = 50"))
            .stdout(predicate::str::contains("implement = 3600"))
            .stdout(predicate::str::contains("max_retry_rounds = 1"));
    }

    #[test]
    fn test_config_show_reads_file_and_env() {
        let dir = create_temp_project();
        write_config(
            &dir,
            "[budgets]\nimplement = 120\n\n[scout]\ntimeframe = \"weekly\"\n",
        );

        shipyard()
            .current_dir(dir.path())
            .env("SHIPYARD_DRY_RUN", "true")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("implement = 120"))
            .stdout(predicate::str::contains("timeframe = \"weekly\""))
            .stdout(predicate::str::contains("dry_run = true"))
            .stdout(predicate::str::contains("deploy = off"));
    }

    #[test]
    fn test_project_dir_flag() {
        let dir = create_temp_project();
        write_config(&dir, "[judge]\nmin_score = 65\n");

        shipyard()
            .args(["config", "show", "--project-dir"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("min_score = 65"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        write_config(&dir, "[judge]\nmax_retry_rounds = 4\nmin_score = 150\n");

        shipyard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings"))
            .stdout(predicate::str::contains("capped"));
    }

    #[test]
    fn test_config_validate_clean() {
        let dir = create_temp_project();
        write_config(&dir, "[judge]\nmin_score = 60\n");

        shipyard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_malformed_config_fails() {
        let dir = create_temp_project();
        write_config(&dir, "[judge\nmin_score = ");

        shipyard()
            .current_dir(dir.path())
            .arg("runs")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse shipyard.toml"));
    }
}

// =============================================================================
// Run inspection
// =============================================================================

mod runs {
    use super::*;

    #[test]
    fn test_runs_empty() {
        let dir = create_temp_project();

        shipyard()
            .current_dir(dir.path())
            .arg("runs")
            .assert()
            .success()
            .stdout(predicate::str::contains("No runs recorded yet"));
    }

    #[test]
    fn test_runs_lists_checkpointed_runs() {
        let dir = create_temp_project();
        seed_run(&dir, "20261001-090000-aaaaaaaa", |s| {
            s.current_phase = Phase::Complete;
        });
        seed_run(&dir, "20261002-090000-bbbbbbbb", |s| {
            s.current_phase = Phase::Implement;
            s.record_error(Phase::Implement, "Implementation failed: tests red");
        });

        shipyard()
            .current_dir(dir.path())
            .arg("runs")
            .assert()
            .success()
            .stdout(predicate::str::contains("20261001-090000-aaaaaaaa"))
            .stdout(predicate::str::contains("20261002-090000-bbbbbbbb"))
            .stdout(predicate::str::contains("implement"))
            .stdout(predicate::str::contains("failed"));
    }

    #[test]
    fn test_status_missing_run_fails() {
        let dir = create_temp_project();

        shipyard()
            .current_dir(dir.path())
            .args(["status", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No run 'nope'"));
    }

    #[test]
    fn test_status_shows_errors_and_warnings() {
        let dir = create_temp_project();
        seed_run(&dir, "run-1", |s| {
            s.current_phase = Phase::Deploy;
            s.record_warning(Phase::Research, "'Alpha': research recommended pivot");
            s.record_error(Phase::Deploy, "Deployment failed: permission denied");
        });

        shipyard()
            .current_dir(dir.path())
            .args(["status", "run-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Run run-1"))
            .stdout(predicate::str::contains("[deploy] Deployment failed"))
            .stdout(predicate::str::contains("[research] 'Alpha'"));
    }

    #[test]
    fn test_status_with_event_log() {
        let dir = create_temp_project();
        seed_run(&dir, "run-2", |s| s.current_phase = Phase::Complete);
        let log = RunLog::new(&dir.path().join(".shipyard/logs"), "run-2");
        log.info(Phase::ScoutTrends, "found 3 trending repos (daily)");

        shipyard()
            .current_dir(dir.path())
            .args(["status", "run-2", "--log"])
            .assert()
            .success()
            .stdout(predicate::str::contains("found 3 trending repos"));
    }
}
