//! Ensemble weather files in the simulator's fixed-column format. Dates
//! are forced into the reference year like every other emitted date.

use crate::control::record::{RecordBuffer, REFERENCE_YEAR, to_reference_year};
use crate::domain::{DssatError, DssatResult};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Station metadata for the weather-file header.
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl Station {
    /// Four-character institute/site code derived from the station name.
    fn insi(&self) -> String {
        let code: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(4)
            .collect::<String>()
            .to_ascii_uppercase();
        format!("{code:<4}")
    }
}

/// One day of forcing data.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub solar: f64,
    pub tmax: f64,
    pub tmin: f64,
    pub rain: f64,
}

pub fn weather_file_name(ensemble_index: usize) -> String {
    format!("WEATH{:03}.WTH", ensemble_index + 1)
}

/// Two-digit reference year plus three-digit day-of-year, the date code
/// used by weather records.
fn weather_date_code(date: NaiveDate) -> String {
    let normalized = to_reference_year(date);
    format!("{:02}{:03}", REFERENCE_YEAR % 100, normalized.ordinal())
}

/// Renders one weather file: station header plus one fixed-column daily
/// record per day.
pub fn render_weather_file(station: &Station, records: &[DailyRecord]) -> String {
    let mean_temperature = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|record| (record.tmax + record.tmin) / 2.0)
            .sum::<f64>()
            / records.len() as f64
    };
    let amplitude = records
        .iter()
        .map(|record| (record.tmax + record.tmin) / 2.0)
        .fold(None::<(f64, f64)>, |bounds, mean| match bounds {
            None => Some((mean, mean)),
            Some((low, high)) => Some((low.min(mean), high.max(mean))),
        })
        .map_or(0.0, |(low, high)| (high - low) / 2.0);

    let mut buffer = RecordBuffer::new();
    buffer.record(&format!("*WEATHER DATA : {}", station.name));
    buffer.blank();
    buffer.record("@ INSI      LAT     LONG  ELEV   TAV   AMP REFHT WNDHT");
    buffer.record(&format!(
        "  {}{:9.3}{:9.3}{:6.0}{:6.1}{:6.1}{:6.1}{:6.1}",
        station.insi(),
        station.latitude,
        station.longitude,
        station.elevation,
        mean_temperature,
        amplitude,
        2.0,
        2.0
    ));
    buffer.record("@DATE  SRAD  TMAX  TMIN  RAIN");
    for record in records {
        buffer.record(&format!(
            "{}{:6.1}{:6.1}{:6.1}{:6.1}",
            weather_date_code(record.date),
            record.solar,
            record.tmax,
            record.tmin,
            record.rain
        ));
    }
    buffer.into_content()
}

/// Writes one weather file per ensemble member.
pub fn write_weather_files(
    directory: &Path,
    station: &Station,
    ensembles: &[Vec<DailyRecord>],
) -> DssatResult<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(ensembles.len());
    for (ensemble_index, records) in ensembles.iter().enumerate() {
        let path = directory.join(weather_file_name(ensemble_index));
        let content = render_weather_file(station, records);
        std::fs::write(&path, content.as_bytes()).map_err(|source| {
            DssatError::io_system(
                "IO.WEATHER_FILE_WRITE",
                format!("failed to write weather file '{}': {}", path.display(), source),
            )
        })?;
        files.push(path);
    }
    Ok(files)
}
