use super::CliError;
use super::helpers::{
    DEFAULT_MANIFEST_NAME, SimulationManifest, connect_pool, ensure_instance_directory,
    load_forcings, load_manifest,
};
use dssat_core::control::write_control_files;
use dssat_core::cultivar::CultivarStore;
use dssat_core::report::build_yield_table;
use dssat_core::run::run_ensemble;
use dssat_core::soil::SoilProfileStore;
use dssat_core::weather::write_weather_files;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct ManifestArgs {
    /// Simulation manifest path
    #[arg(long, default_value = DEFAULT_MANIFEST_NAME)]
    manifest: PathBuf,
}

pub(super) async fn run_prepare_command(args: ManifestArgs) -> Result<i32, CliError> {
    let manifest = load_manifest(&args.manifest)?;
    prepare(&manifest).await
}

pub(super) fn run_run_command(args: ManifestArgs) -> Result<i32, CliError> {
    let manifest = load_manifest(&args.manifest)?;
    run_simulator(&manifest)
}

pub(super) async fn run_report_command(args: ManifestArgs) -> Result<i32, CliError> {
    let manifest = load_manifest(&args.manifest)?;
    report(&manifest).await
}

pub(super) async fn run_simulate_command(args: ManifestArgs) -> Result<i32, CliError> {
    let manifest = load_manifest(&args.manifest)?;
    println!("Preparing ensemble input files...");
    prepare(&manifest).await?;
    println!("Running simulator...");
    run_simulator(&manifest)?;
    println!("Building yield table...");
    report(&manifest).await?;
    println!("Completed simulation for gid {}.", manifest.gid);
    Ok(0)
}

async fn prepare(manifest: &SimulationManifest) -> Result<i32, CliError> {
    ensure_instance_directory(&manifest.instance_directory)?;

    if let Some(forcings_path) = &manifest.forcings {
        let forcings = load_forcings(forcings_path)?;
        if forcings.ensembles.len() != manifest.ensemble_members {
            tracing::warn!(
                supplied = forcings.ensembles.len(),
                expected = manifest.ensemble_members,
                "forcings do not cover every ensemble member"
            );
        }
        let files = write_weather_files(
            &manifest.instance_directory,
            &manifest.station(),
            &forcings.ensembles,
        )
        .map_err(CliError::Bridge)?;
        println!("Wrote {} weather files.", files.len());
    }

    let pool = connect_pool(&manifest.database_url).await?;
    let cultivars = CultivarStore::new(&pool, &manifest.schema).map_err(CliError::Bridge)?;
    let soils = SoilProfileStore::new(&pool, &manifest.schema).map_err(CliError::Bridge)?;
    let plan = manifest.control_file_plan()?;

    let outcome = write_control_files(&cultivars, &soils, &plan)
        .await
        .map_err(CliError::Bridge)?;
    pool.close().await;

    println!(
        "Prepared {} control files in '{}'.",
        outcome.files.len(),
        manifest.instance_directory.display()
    );
    println!("Cultivars: {}", outcome.cultivar_names.join(", "));
    Ok(0)
}

fn run_simulator(manifest: &SimulationManifest) -> Result<i32, CliError> {
    let command = manifest.simulator_command();
    let outcomes = run_ensemble(
        &command,
        &manifest.instance_directory,
        manifest.ensemble_members,
    )
    .map_err(CliError::Bridge)?;
    println!("Completed {} simulator runs.", outcomes.len());
    Ok(0)
}

async fn report(manifest: &SimulationManifest) -> Result<i32, CliError> {
    let crop = manifest.crop_kind()?;
    let pool = connect_pool(&manifest.database_url).await?;
    let summary = build_yield_table(
        &pool,
        &manifest.schema,
        &manifest.instance_directory,
        manifest.gid,
        manifest.ensemble_members,
        crop,
    )
    .await
    .map_err(CliError::Bridge)?;
    pool.close().await;

    println!(
        "Yield table: {} rows ({} labeled '{}'), mean grain weight {:.1} kg/ha.",
        summary.rows, summary.labeled, crop, summary.mean_grain_weight
    );
    Ok(0)
}
