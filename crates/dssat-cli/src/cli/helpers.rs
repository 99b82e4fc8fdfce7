use super::CliError;
use anyhow::Context;
use chrono::NaiveDate;
use dssat_core::control::ControlFilePlan;
use dssat_core::domain::{CropKind, DssatError, FertilizerEvent, IrrigationEvent, MoistureInput};
use dssat_core::run::{DEFAULT_RUN_MODE, SIMULATOR_EXECUTABLE, SimulatorCommand};
use dssat_core::weather::{DailyRecord, Station};
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) const DEFAULT_MANIFEST_NAME: &str = "simulation-manifest.json";

/// One simulation scenario: where the model instance lives, which region
/// and ensemble to run, and the agronomic schedules.
#[derive(Debug, Deserialize, Clone)]
pub(super) struct SimulationManifest {
    #[serde(rename = "databaseUrl")]
    pub(super) database_url: String,
    pub(super) schema: String,
    pub(super) crop: String,
    #[serde(rename = "ensembleMembers")]
    pub(super) ensemble_members: usize,
    #[serde(rename = "startDate")]
    pub(super) start_date: NaiveDate,
    #[serde(rename = "plantingDate")]
    pub(super) planting_date: NaiveDate,
    pub(super) gid: i64,
    pub(super) latitude: f64,
    pub(super) longitude: f64,
    #[serde(default)]
    pub(super) elevation: f64,
    #[serde(rename = "instanceDirectory")]
    pub(super) instance_directory: PathBuf,
    #[serde(default = "default_executable")]
    pub(super) executable: PathBuf,
    #[serde(default)]
    pub(super) launcher: Option<PathBuf>,
    #[serde(rename = "runMode", default = "default_run_mode")]
    pub(super) run_mode: String,
    #[serde(rename = "moistureDepths")]
    pub(super) moisture_depths: Vec<f64>,
    #[serde(rename = "soilMoisture")]
    pub(super) soil_moisture: MoistureInput,
    #[serde(default)]
    pub(super) irrigation: Vec<IrrigationEvent>,
    #[serde(default)]
    pub(super) fertilizer: Vec<FertilizerEvent>,
    #[serde(default)]
    pub(super) forcings: Option<PathBuf>,
    #[serde(rename = "stationName", default)]
    pub(super) station_name: Option<String>,
}

fn default_executable() -> PathBuf {
    PathBuf::from(SIMULATOR_EXECUTABLE)
}

fn default_run_mode() -> String {
    DEFAULT_RUN_MODE.to_string()
}

impl SimulationManifest {
    pub(super) fn crop_kind(&self) -> Result<CropKind, CliError> {
        CropKind::from_name(&self.crop).ok_or_else(|| {
            CliError::Bridge(DssatError::input_validation(
                "INPUT.MANIFEST_CROP",
                format!("unsupported crop '{}'", self.crop),
            ))
        })
    }

    pub(super) fn control_file_plan(&self) -> Result<ControlFilePlan, CliError> {
        Ok(ControlFilePlan {
            destination: self.instance_directory.clone(),
            crop: self.crop_kind()?,
            ensemble_count: self.ensemble_members,
            start: self.start_date,
            planting: self.planting_date,
            gid: self.gid,
            moisture_depths: self.moisture_depths.clone(),
            moisture: self.soil_moisture.clone(),
            irrigation: self.irrigation.clone(),
            fertilizer: self.fertilizer.clone(),
        })
    }

    pub(super) fn simulator_command(&self) -> SimulatorCommand {
        SimulatorCommand {
            executable: self.executable.clone(),
            launcher: self.launcher.clone(),
            run_mode: self.run_mode.clone(),
        }
    }

    pub(super) fn station(&self) -> Station {
        Station {
            name: self
                .station_name
                .clone()
                .unwrap_or_else(|| format!("GID{}", self.gid)),
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
        }
    }
}

/// Per-ensemble forcing data for weather-file emission.
#[derive(Debug, Deserialize)]
pub(super) struct ForcingsFile {
    pub(super) ensembles: Vec<Vec<DailyRecord>>,
}

pub(super) fn load_manifest(path: &Path) -> Result<SimulationManifest, CliError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read simulation manifest '{}'", path.display()))?;
    serde_json::from_str::<SimulationManifest>(&content)
        .with_context(|| format!("failed to parse simulation manifest '{}'", path.display()))
        .map_err(CliError::from)
}

pub(super) fn load_forcings(path: &Path) -> Result<ForcingsFile, CliError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read forcings file '{}'", path.display()))?;
    serde_json::from_str::<ForcingsFile>(&content)
        .with_context(|| format!("failed to parse forcings file '{}'", path.display()))
        .map_err(CliError::from)
}

pub(super) async fn connect_pool(url: &str) -> Result<PgPool, CliError> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(url)
        .await
        .map_err(|source| {
            CliError::Bridge(DssatError::database(
                "DB.CONNECT",
                format!("failed to connect to the cultivar database: {source}"),
            ))
        })
}

pub(super) fn ensure_instance_directory(path: &Path) -> Result<(), CliError> {
    fs::create_dir_all(path).map_err(|source| {
        CliError::Bridge(DssatError::io_system(
            "IO.INSTANCE_DIRECTORY",
            format!(
                "failed to create model instance directory '{}': {}",
                path.display(),
                source
            ),
        ))
    })
}
