//! External simulator invocation, one blocking launch per ensemble
//! member. No retry, no timeout: a hung simulator blocks the run, and any
//! failure aborts the remaining members.

use crate::control::control_file_name;
use crate::domain::{DssatError, DssatResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Fixed name of the legacy simulator binary.
pub const SIMULATOR_EXECUTABLE: &str = "DSSAT_Ex.exe";

/// Fixed name of the result file the simulator leaves in its working
/// directory after every run.
pub const RAW_OUTPUT_NAME: &str = "PlantGro.OUT";

/// Run-mode letter passed as the first positional argument.
pub const DEFAULT_RUN_MODE: &str = "D";

/// How to launch the simulator. The launcher prefix covers hosting the
/// Windows binary (e.g. through `wine`) without changing the argument
/// contract.
#[derive(Debug, Clone)]
pub struct SimulatorCommand {
    pub executable: PathBuf,
    pub launcher: Option<PathBuf>,
    pub run_mode: String,
}

impl Default for SimulatorCommand {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(SIMULATOR_EXECUTABLE),
            launcher: None,
            run_mode: DEFAULT_RUN_MODE.to_string(),
        }
    }
}

/// Structured result of one simulator launch.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub ensemble_index: usize,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub artifact: PathBuf,
}

/// Per-ensemble name the raw output file is renamed to.
pub fn artifact_name(ensemble_index: usize) -> String {
    format!("PLANTGRO{:03}.OUT", ensemble_index + 1)
}

/// Launches the simulator for one ensemble member, blocking until it
/// exits, then claims its fixed-named output under the ensemble-indexed
/// name. The working directory is set on the child process only.
pub fn run_ensemble_member(
    command: &SimulatorCommand,
    instance_dir: &Path,
    ensemble_count: usize,
    ensemble_index: usize,
) -> DssatResult<RunOutcome> {
    let input_name = control_file_name(ensemble_count, ensemble_index);

    let mut process = match &command.launcher {
        Some(launcher) => {
            let mut process = Command::new(launcher);
            process.arg(&command.executable);
            process
        }
        None => Command::new(&command.executable),
    };
    process
        .arg(&command.run_mode)
        .arg(&input_name)
        .current_dir(instance_dir);

    let output = process.output().map_err(|source| {
        DssatError::io_system(
            "IO.RUN_SPAWN",
            format!(
                "failed to launch simulator '{}' in '{}': {}",
                command.executable.display(),
                instance_dir.display(),
                source
            ),
        )
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    tracing::debug!(ensemble = ensemble_index + 1, %stdout, %stderr, "simulator output");

    if !output.status.success() {
        return Err(DssatError::computation(
            "RUN.SIMULATOR_EXIT",
            format!(
                "simulator failed on '{}' with {}",
                input_name,
                output
                    .status
                    .code()
                    .map_or_else(|| "termination by signal".to_string(), |code| format!(
                        "exit code {code}"
                    ))
            ),
        ));
    }

    let raw = instance_dir.join(RAW_OUTPUT_NAME);
    let artifact = instance_dir.join(artifact_name(ensemble_index));
    std::fs::rename(&raw, &artifact).map_err(|source| {
        DssatError::io_system(
            "IO.RUN_ARTIFACT_RENAME",
            format!(
                "no simulator output at '{}' after running '{}' (simulator likely produced nothing): {}",
                raw.display(),
                input_name,
                source
            ),
        )
    })?;

    Ok(RunOutcome {
        ensemble_index,
        exit_code: output.status.code().unwrap_or(-1),
        stdout,
        stderr,
        artifact,
    })
}

/// Drives the simulator across the whole ensemble, strictly
/// sequentially. The first failing member aborts the run; earlier
/// members' artifacts stay in place.
pub fn run_ensemble(
    command: &SimulatorCommand,
    instance_dir: &Path,
    ensemble_count: usize,
) -> DssatResult<Vec<RunOutcome>> {
    let mut outcomes = Vec::with_capacity(ensemble_count);
    for ensemble_index in 0..ensemble_count {
        outcomes.push(run_ensemble_member(
            command,
            instance_dir,
            ensemble_count,
            ensemble_index,
        )?);
    }
    Ok(outcomes)
}
