//! Fixed-column section writers for the simulator control file.
//!
//! Each writer emits one section of the legacy grammar, byte-for-byte
//! including column positions and CRLF terminators. Values wider than
//! their columns are not rejected here; the external consumer is the
//! only authority on validity.

use super::record::{RecordBuffer, day_of_year_field};
use crate::cultivar::CultivarRecord;
use crate::domain::{FertilizerEvent, IrrigationEvent};
use chrono::{Days, NaiveDate};

pub(crate) fn file_names(buffer: &mut RecordBuffer, ensemble_index: usize) {
    buffer.record("*MODEL INPUT FILE            B     1     1     5   999     0");
    buffer.record("*FILES");
    buffer.record("MODEL          RICER040");
    buffer.record("FILEX          IRMZ8601.RIX");
    buffer.record("FILEA          IRMZ8601.RIA");
    buffer.record("FILET          IRMZ8601.RIT");
    buffer.record("SPECIES        RICER040.SPE");
    buffer.record("ECOTYPE        RICER040.ECO");
    buffer.record("CULTIVAR       RICER040.CUL");
    buffer.record("PESTS          RICER040.PST");
    buffer.record("SOILS          SOIL.SOL");
    buffer.record(&format!("WEATHER        WEATH{:03}.WTH", ensemble_index + 1));
    buffer.record("OUTPUT         OVERVIEW");
}

pub(crate) fn simulation_control(buffer: &mut RecordBuffer, start: NaiveDate) {
    buffer.record("*SIMULATION CONTROL");
    buffer.record(&format!(
        "                   1     1     S {}  2150 IRRI MUNOZ JAN 86 UREASE  RICER",
        day_of_year_field(start)
    ));
    buffer.record("                   Y     Y     N     N     N     N     N     N");
    buffer.record("                   M     M     E     R     S     C     R     1     G");
    buffer.record("                   R     R     R     R     M");
    buffer.record(
        "                   N     Y     Y     1     Y     N     Y     Y     N     N     Y     N     N",
    );
}

pub(crate) fn automatic_management(buffer: &mut RecordBuffer, start: NaiveDate) {
    let window_open = start - Days::new(3);
    let window_close = window_open + Days::new(14);
    buffer.record("!AUTOMATIC MANAGEM");
    buffer.record(&format!(
        "               {} {}   40.  100.   30.   40.   10.",
        day_of_year_field(window_open),
        day_of_year_field(window_close)
    ));
    buffer.record("                 30.   50.  100. IB001 IB001  10.0 1.000");
    buffer.record("                 30.   50.   25. IB001 IB001");
    buffer.record("                100.     1   20.");
    buffer.record("                     0 1986036  100.    0.");
}

pub(crate) fn experiment_details(buffer: &mut RecordBuffer) {
    buffer.record("*EXP.DETAILS");
    buffer.record("  1IRMZ8601 RI IRRI,MUNOZ JAN 86 UREASE INHIBITORS");
}

pub(crate) fn treatments(buffer: &mut RecordBuffer) {
    buffer.record("*TREATMENTS");
    buffer.record("  5 1 0 0 140 kg N as urea(2/3 18 D");
}

pub(crate) fn cultivar_summary(buffer: &mut RecordBuffer) {
    buffer.record("*CULTIVARS");
    buffer.record("   RI IB0012 IR 58");
}

pub(crate) fn fields(buffer: &mut RecordBuffer) {
    buffer.record("*FIELDS");
    buffer.record("   IRMZ0001 IRMZ8601   0.0    0. IB000    0.  100. 00000         50. IBRI910002");
    buffer.record("           0.00000         0.00000      0.00               1.0  100.   1.0   0.0");
}

pub(crate) fn initial_conditions(
    buffer: &mut RecordBuffer,
    start: NaiveDate,
    layer_depths: &[f64],
    moisture: &[f64],
) {
    buffer.record("*INITIAL CONDITIONS");
    buffer.record(&format!(
        "   RI    {}  600.    0.  1.00  1.00   0.0   800  1.10  0.00  100.   15.",
        day_of_year_field(start)
    ));
    for (depth, wetness) in layer_depths.iter().zip(moisture.iter()) {
        buffer.record(&format!("{depth:8.0}{wetness:8.3}{:8.1}{:8.1}", 0.5, 0.1));
    }
}

pub(crate) fn planting(buffer: &mut RecordBuffer, planting_date: NaiveDate) {
    buffer.record("*PLANTING DETAILS");
    buffer.record(&format!(
        "   {}     -99  75.0  25.0     T     H   20.    0.   2.0    0.   23.  26.0   3.0   0.0",
        day_of_year_field(planting_date)
    ));
}

pub(crate) fn irrigation(buffer: &mut RecordBuffer, events: &[IrrigationEvent]) {
    buffer.record("*IRRIGATION");
    buffer.record("   1.000   30.   75.  -99. GS000 IR001   1.0");
    for (index, event) in events.iter().enumerate() {
        buffer.record(&format!(
            "   {} IR{:03} {:4.1}",
            day_of_year_field(event.date),
            index + 1,
            event.amount
        ));
    }
}

pub(crate) fn fertilizer(buffer: &mut RecordBuffer, events: &[FertilizerEvent]) {
    buffer.record("*FERTILIZERS");
    for (index, event) in events.iter().enumerate() {
        buffer.record(&format!(
            "   {} FE{:03} AP{:03}   {:02}.   {:02}.    0.    0.    0.    0.   -99",
            day_of_year_field(event.date),
            index + 1,
            index + 1,
            event.amount,
            event.nitrogen_percent
        ));
    }
}

pub(crate) fn residues(buffer: &mut RecordBuffer) {
    buffer.record("*RESIDUES");
}

pub(crate) fn chemicals(buffer: &mut RecordBuffer) {
    buffer.record("*CHEMICALS");
}

pub(crate) fn tillage(buffer: &mut RecordBuffer) {
    buffer.record("*TILLAGE");
}

pub(crate) fn environment(buffer: &mut RecordBuffer) {
    buffer.record("*ENVIRONMENT");
}

pub(crate) fn harvest(buffer: &mut RecordBuffer) {
    buffer.record("*HARVEST");
}

pub(crate) fn soil(buffer: &mut RecordBuffer, profile_lines: &[String], layer_depths: &[f64]) {
    buffer.record("*SOIL");
    if let Some((_, kept)) = profile_lines.split_last() {
        for line in kept {
            buffer.record(line);
        }
    }
    buffer.blank();
    for depth in layer_depths {
        buffer.record(&format!(
            "{depth:6.0}   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0   0.0"
        ));
    }
}

pub(crate) fn cultivar_genetics(buffer: &mut RecordBuffer, cultivar: &CultivarRecord) {
    buffer.record("*CULTIVAR");
    buffer.push_raw(&cultivar.genotype_line());
}
