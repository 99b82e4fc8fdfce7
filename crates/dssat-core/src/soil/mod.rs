//! Soil profile sampling and moisture interpolation.
//!
//! Profiles are stored as complete fixed-format text blocks; this module
//! never interprets them beyond the per-layer depth column needed to
//! align moisture values with the sampled layering.

use crate::domain::{DssatError, DssatResult, cycle_to_length, schema_identifier};
use sqlx::PgPool;

/// Number of header lines preceding the layer table in a profile block.
const PROFILE_HEADER_LINES: usize = 3;

/// Samples stored soil profile blocks for a region.
pub struct SoilProfileStore<'a> {
    pool: &'a PgPool,
    schema: &'a str,
}

impl<'a> SoilProfileStore<'a> {
    pub fn new(pool: &'a PgPool, schema: &'a str) -> DssatResult<Self> {
        schema_identifier(schema)?;
        Ok(Self { pool, schema })
    }

    /// Returns one profile block per ensemble member, cycling the sampled
    /// rows when fewer profiles exist than members. Falls back to the
    /// nearest profiles by centroid distance when none intersect the
    /// region polygon.
    pub async fn sample_profiles(&self, gid: i64, count: usize) -> DssatResult<Vec<String>> {
        let mut rows: Vec<(String,)> = sqlx::query_as(&self.intersect_query())
            .bind(gid)
            .bind(count as i64)
            .fetch_all(self.pool)
            .await
            .map_err(|source| query_error("DB.SOIL_INTERSECT", gid, &source))?;

        if rows.is_empty() {
            rows = sqlx::query_as(&self.nearest_query())
                .bind(gid)
                .bind(count as i64)
                .fetch_all(self.pool)
                .await
                .map_err(|source| query_error("DB.SOIL_NEAREST", gid, &source))?;
        }

        if rows.is_empty() {
            return Err(DssatError::database(
                "DB.SOIL_EMPTY",
                format!("no soil profiles found for gid {gid}"),
            ));
        }

        let profiles: Vec<String> = rows.into_iter().map(|(profile,)| profile).collect();
        Ok(cycle_to_length(&profiles, count))
    }

    fn intersect_query(&self) -> String {
        format!(
            "SELECT s.profile FROM dssat.soils AS s, {schema}.agareas AS a \
             WHERE st_intersects(s.geom, a.geom) AND a.gid = $1 LIMIT $2",
            schema = self.schema
        )
    }

    fn nearest_query(&self) -> String {
        format!(
            "SELECT s.profile FROM dssat.soils AS s, {schema}.agareas AS a \
             WHERE a.gid = $1 \
             ORDER BY st_centroid(s.geom) <-> st_centroid(a.geom) LIMIT $2",
            schema = self.schema
        )
    }
}

fn query_error(placeholder: &str, gid: i64, source: &sqlx::Error) -> DssatError {
    DssatError::database(
        placeholder,
        format!("soil profile query failed for gid {gid}: {source}"),
    )
}

/// Splits a profile block into its lines, tolerating either CRLF or LF
/// storage.
pub fn profile_lines(profile: &str) -> Vec<String> {
    profile.lines().map(str::to_string).collect()
}

/// Extracts per-layer depths from a profile block. Layer rows follow the
/// three header lines and exclude the trailing summary line; the depth is
/// the first column.
pub fn layer_depths(profile: &str) -> DssatResult<Vec<f64>> {
    let lines: Vec<&str> = profile.lines().collect();
    if lines.len() <= PROFILE_HEADER_LINES + 1 {
        return Err(DssatError::input_validation(
            "INPUT.SOIL_PROFILE_SHAPE",
            format!(
                "soil profile has {} lines; expected header plus at least one layer",
                lines.len()
            ),
        ));
    }

    lines[PROFILE_HEADER_LINES..lines.len() - 1]
        .iter()
        .map(|line| {
            line.split_whitespace()
                .next()
                .ok_or_else(|| depth_error(line))?
                .parse::<f64>()
                .map_err(|_| depth_error(line))
        })
        .collect()
}

fn depth_error(line: &str) -> DssatError {
    DssatError::input_validation(
        "INPUT.SOIL_PROFILE_DEPTH",
        format!("soil profile layer row '{line}' has no parseable depth"),
    )
}

/// Maps moisture values given at `value_depths` onto the sampled
/// profile's `target_depths`. Each target layer takes the value of the
/// first input layer at least as deep, clamping to the deepest input
/// layer below it.
pub fn interpolate_moisture(
    values: &[f64],
    value_depths: &[f64],
    target_depths: &[f64],
) -> DssatResult<Vec<f64>> {
    if values.is_empty() || values.len() != value_depths.len() {
        return Err(DssatError::input_validation(
            "INPUT.SOIL_MOISTURE_SHAPE",
            format!(
                "{} moisture values for {} depth layers",
                values.len(),
                value_depths.len()
            ),
        ));
    }

    Ok(target_depths
        .iter()
        .map(|target| {
            value_depths
                .iter()
                .position(|depth| *depth >= *target)
                .map_or_else(|| values[values.len() - 1], |index| values[index])
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{interpolate_moisture, layer_depths, profile_lines};

    const PROFILE: &str = "*IRRI920001 IRRI 1992 sample\r\n\
        @SITE COUNTRY\r\n\
        @ SLB SLMH SLLL SDUL\r\n\
        15 A 0.28 0.41\r\n\
        30 B 0.26 0.40\r\n\
        60 C 0.25 0.39\r\n\
        summary row\r\n";

    #[test]
    fn depths_come_from_the_layer_table_first_column() {
        let depths = layer_depths(PROFILE).expect("profile should parse");
        assert_eq!(depths, vec![15.0, 30.0, 60.0]);
    }

    #[test]
    fn headerless_profiles_are_rejected() {
        assert!(layer_depths("one\r\ntwo\r\n").is_err());
        assert!(layer_depths("h1\nh2\nh3\n? B\nsummary").is_err());
    }

    #[test]
    fn profile_lines_tolerate_both_line_endings() {
        assert_eq!(profile_lines("a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(profile_lines("a\nb"), vec!["a", "b"]);
    }

    #[test]
    fn moisture_maps_to_the_first_input_layer_at_least_as_deep() {
        let interpolated = interpolate_moisture(
            &[0.25, 0.3, 0.28],
            &[10.0, 40.0, 100.0],
            &[15.0, 30.0, 60.0],
        )
        .expect("shapes match");
        assert_eq!(interpolated, vec![0.3, 0.3, 0.28]);
    }

    #[test]
    fn moisture_clamps_below_the_deepest_input_layer() {
        let interpolated =
            interpolate_moisture(&[0.2, 0.35], &[20.0, 50.0], &[15.0, 90.0]).expect("shapes match");
        assert_eq!(interpolated, vec![0.2, 0.35]);
    }

    #[test]
    fn mismatched_moisture_shapes_are_rejected() {
        assert!(interpolate_moisture(&[0.2], &[10.0, 20.0], &[15.0]).is_err());
        assert!(interpolate_moisture(&[], &[], &[15.0]).is_err());
    }
}
