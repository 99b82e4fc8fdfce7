//! Control-file assembly: one fixed-format input file per ensemble
//! member, sections in the exact order the simulator grammar requires.

pub mod record;
mod sections;

use crate::cultivar::{CultivarRecord, CultivarStore};
use crate::domain::{
    CropKind, DssatError, DssatResult, FertilizerEvent, IrrigationEvent, MoistureInput,
};
use crate::soil::{self, SoilProfileStore};
use chrono::NaiveDate;
use record::{RecordBuffer, to_reference_year, write_control_artifact};
use std::path::{Path, PathBuf};

/// Everything needed to render one ensemble member's control file.
/// Constructed fresh per member, consumed once.
#[derive(Debug, Clone)]
pub struct EnsembleScenario {
    pub ensemble_index: usize,
    pub start: NaiveDate,
    pub planting: NaiveDate,
    pub irrigation: Vec<IrrigationEvent>,
    pub fertilizer: Vec<FertilizerEvent>,
    pub profile_lines: Vec<String>,
    pub layer_depths: Vec<f64>,
    pub moisture: Vec<f64>,
    pub cultivar: CultivarRecord,
}

/// Assembly inputs shared across the whole ensemble of one region.
#[derive(Debug, Clone)]
pub struct ControlFilePlan {
    pub destination: PathBuf,
    pub crop: CropKind,
    pub ensemble_count: usize,
    pub start: NaiveDate,
    pub planting: NaiveDate,
    pub gid: i64,
    pub moisture_depths: Vec<f64>,
    pub moisture: MoistureInput,
    pub irrigation: Vec<IrrigationEvent>,
    pub fertilizer: Vec<FertilizerEvent>,
}

/// What the assembler produced. `final_depths`/`final_moisture` reflect
/// only the last ensemble member processed; they are not an ensemble
/// aggregate.
#[derive(Debug, Clone)]
pub struct ControlFileOutcome {
    pub files: Vec<PathBuf>,
    pub cultivar_names: Vec<String>,
    pub final_depths: Vec<f64>,
    pub final_moisture: Vec<f64>,
}

pub fn control_file_name(ensemble_count: usize, ensemble_index: usize) -> String {
    format!("DSSAT{}_{:03}.INP", ensemble_count, ensemble_index + 1)
}

/// Fallback fertilizer schedule when none is supplied: one application at
/// simulation start, amount 30, nitrogen percent 20.
pub fn default_fertilizer(start: NaiveDate) -> Vec<FertilizerEvent> {
    vec![FertilizerEvent {
        date: start,
        amount: 30,
        nitrogen_percent: 20,
    }]
}

/// Fallback irrigation schedule when none is supplied: one zero-amount
/// entry at simulation start.
pub fn default_irrigation(start: NaiveDate) -> Vec<IrrigationEvent> {
    vec![IrrigationEvent {
        date: start,
        amount: 0.0,
    }]
}

/// Renders one complete control file, sections in grammar order. Pure;
/// every date in the scenario is expected to be normalized already.
pub fn render_control_file(scenario: &EnsembleScenario) -> String {
    let mut buffer = RecordBuffer::new();
    sections::file_names(&mut buffer, scenario.ensemble_index);
    sections::simulation_control(&mut buffer, scenario.start);
    sections::automatic_management(&mut buffer, scenario.start);
    sections::experiment_details(&mut buffer);
    sections::treatments(&mut buffer);
    sections::cultivar_summary(&mut buffer);
    sections::fields(&mut buffer);
    sections::initial_conditions(
        &mut buffer,
        scenario.start,
        &scenario.layer_depths,
        &scenario.moisture,
    );
    sections::planting(&mut buffer, scenario.planting);
    sections::irrigation(&mut buffer, &scenario.irrigation);
    sections::fertilizer(&mut buffer, &scenario.fertilizer);
    sections::residues(&mut buffer);
    sections::chemicals(&mut buffer);
    sections::tillage(&mut buffer);
    sections::environment(&mut buffer);
    sections::harvest(&mut buffer);
    sections::soil(&mut buffer, &scenario.profile_lines, &scenario.layer_depths);
    sections::cultivar_genetics(&mut buffer, &scenario.cultivar);
    buffer.into_content()
}

/// Assembles one control file per ensemble member: samples soil profiles,
/// interpolates moisture onto each sampled layering, resolves the
/// member's cultivar, renders and writes the file. Strictly sequential.
pub async fn write_control_files(
    cultivars: &CultivarStore<'_>,
    soils: &SoilProfileStore<'_>,
    plan: &ControlFilePlan,
) -> DssatResult<ControlFileOutcome> {
    let start = to_reference_year(plan.start);
    let planting = to_reference_year(plan.planting);
    let irrigation = normalized_schedule(&plan.irrigation, || default_irrigation(start), |event| {
        IrrigationEvent {
            date: to_reference_year(event.date),
            ..*event
        }
    });
    let fertilizer = normalized_schedule(&plan.fertilizer, || default_fertilizer(start), |event| {
        FertilizerEvent {
            date: to_reference_year(event.date),
            ..*event
        }
    });

    let moisture_slots = plan
        .moisture
        .fill(plan.ensemble_count, plan.moisture_depths.len());
    if moisture_slots.len() != plan.ensemble_count {
        return Err(DssatError::input_validation(
            "INPUT.CONTROL_MOISTURE_SLOTS",
            format!(
                "moisture input filled {} of {} ensemble slots",
                moisture_slots.len(),
                plan.ensemble_count
            ),
        ));
    }

    let profiles = soils.sample_profiles(plan.gid, plan.ensemble_count).await?;

    let mut files = Vec::with_capacity(plan.ensemble_count);
    let mut cultivar_names = Vec::with_capacity(plan.ensemble_count);
    let mut final_depths = Vec::new();
    let mut final_moisture = Vec::new();

    for ensemble_index in 0..plan.ensemble_count {
        let profile = &profiles[ensemble_index];
        let layer_depths = soil::layer_depths(profile)?;
        let moisture = soil::interpolate_moisture(
            &moisture_slots[ensemble_index],
            &plan.moisture_depths,
            &layer_depths,
        )?;
        let cultivar = cultivars.resolve(plan.crop, ensemble_index, plan.gid).await?;
        cultivar_names.push(cultivar.name.clone());

        let scenario = EnsembleScenario {
            ensemble_index,
            start,
            planting,
            irrigation: irrigation.clone(),
            fertilizer: fertilizer.clone(),
            profile_lines: soil::profile_lines(profile),
            layer_depths: layer_depths.clone(),
            moisture: moisture.clone(),
            cultivar,
        };

        let path = plan
            .destination
            .join(control_file_name(plan.ensemble_count, ensemble_index));
        write_rendered_file(&path, &render_control_file(&scenario))?;
        tracing::info!(ensemble = ensemble_index + 1, path = %path.display(), "wrote control file");

        files.push(path);
        final_depths = layer_depths;
        final_moisture = moisture;
    }

    Ok(ControlFileOutcome {
        files,
        cultivar_names,
        final_depths,
        final_moisture,
    })
}

fn normalized_schedule<T: Clone>(
    supplied: &[T],
    fallback: impl FnOnce() -> Vec<T>,
    normalize: impl Fn(&T) -> T,
) -> Vec<T> {
    if supplied.is_empty() {
        fallback()
    } else {
        supplied.iter().map(normalize).collect()
    }
}

fn write_rendered_file(path: &Path, content: &str) -> DssatResult<()> {
    write_control_artifact(path, content).map_err(|source| {
        DssatError::io_system(
            "IO.CONTROL_FILE_WRITE",
            format!("failed to write control file '{}': {}", path.display(), source),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{
        EnsembleScenario, control_file_name, default_fertilizer, default_irrigation,
        normalized_schedule, render_control_file,
    };
    use crate::control::record::to_reference_year;
    use crate::cultivar::CultivarRecord;
    use crate::domain::FertilizerEvent;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn scenario() -> EnsembleScenario {
        EnsembleScenario {
            ensemble_index: 0,
            start: date(2009, 5, 1),
            planting: date(2009, 5, 15),
            irrigation: default_irrigation(date(2009, 5, 1)),
            fertilizer: default_fertilizer(date(2009, 5, 1)),
            profile_lines: vec![
                "*IRRI920001".to_string(),
                "@SITE".to_string(),
                "@ SLB".to_string(),
                "15 A".to_string(),
                "summary".to_string(),
            ],
            layer_depths: vec![15.0],
            moisture: vec![0.25],
            cultivar: CultivarRecord {
                p1: 881.0,
                p2r: 52.5,
                p5: 550.0,
                p2o: 12.0,
                g1: 65.0,
                g2: 0.025,
                g3: 1.0,
                g4: 1.0,
                name: "IR 64".to_string(),
            },
        }
    }

    #[test]
    fn control_file_names_encode_ensemble_count_and_index() {
        assert_eq!(control_file_name(20, 0), "DSSAT20_001.INP");
        assert_eq!(control_file_name(3, 2), "DSSAT3_003.INP");
    }

    #[test]
    fn sections_appear_in_grammar_order() {
        let content = render_control_file(&scenario());
        let order = [
            "*MODEL INPUT FILE",
            "*FILES",
            "*SIMULATION CONTROL",
            "!AUTOMATIC MANAGEM",
            "*EXP.DETAILS",
            "*TREATMENTS",
            "*CULTIVARS",
            "*FIELDS",
            "*INITIAL CONDITIONS",
            "*PLANTING DETAILS",
            "*IRRIGATION",
            "*FERTILIZERS",
            "*RESIDUES",
            "*CHEMICALS",
            "*TILLAGE",
            "*ENVIRONMENT",
            "*HARVEST",
            "*SOIL",
            "*CULTIVAR\r\n",
        ];
        let mut cursor = 0;
        for marker in order {
            let position = content[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("section '{marker}' missing or out of order"));
            cursor += position + marker.len();
        }
    }

    #[test]
    fn rendered_file_ends_with_the_unterminated_genotype_record() {
        let content = render_control_file(&scenario());
        assert!(content.ends_with("  1.00  1.00"));
        assert!(!content.ends_with("\r\n"));
    }

    #[test]
    fn empty_schedules_fall_back_while_supplied_dates_are_normalized() {
        let start = date(2009, 5, 1);

        let fallback = normalized_schedule(
            &[],
            || default_fertilizer(start),
            |event: &FertilizerEvent| *event,
        );
        assert_eq!(fallback, default_fertilizer(start));

        let supplied = [FertilizerEvent {
            date: date(2021, 6, 2),
            amount: 45,
            nitrogen_percent: 15,
        }];
        let normalized = normalized_schedule(
            &supplied,
            || default_fertilizer(start),
            |event| FertilizerEvent {
                date: to_reference_year(event.date),
                ..*event
            },
        );
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].date, date(2009, 6, 2));
        assert_eq!(normalized[0].amount, 45);
    }

    #[test]
    fn default_schedules_anchor_to_the_start_date() {
        let start = date(2009, 6, 1);
        let fertilizer = default_fertilizer(start);
        assert_eq!(fertilizer.len(), 1);
        assert_eq!(fertilizer[0].date, start);
        assert_eq!(fertilizer[0].amount, 30);
        assert_eq!(fertilizer[0].nitrogen_percent, 20);

        let irrigation = default_irrigation(start);
        assert_eq!(irrigation.len(), 1);
        assert_eq!(irrigation[0].amount, 0.0);
    }
}
