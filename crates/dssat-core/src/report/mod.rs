//! Post-run yield reporting: extracts harvested grain weight from the
//! per-ensemble growth files, persists one row per member, and labels
//! the rows with the crop type.

use crate::domain::{CropKind, DssatError, DssatResult, schema_identifier};
use crate::run::artifact_name;
use sqlx::PgPool;
use std::path::Path;

/// Grain-weight column header in the simulator growth table.
const GRAIN_WEIGHT_COLUMN: &str = "GWAD";

/// Pulls the final grain weight (kg/ha) out of a growth-file table.
///
/// The table header is the line starting with `@` that names the
/// columns; the value is taken from the last data row.
pub fn final_grain_weight(source: &str) -> DssatResult<f64> {
    let mut column: Option<usize> = None;
    let mut weight: Option<f64> = None;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('@') {
            column = trimmed
                .split_whitespace()
                .position(|token| token == GRAIN_WEIGHT_COLUMN);
            continue;
        }
        let Some(index) = column else { continue };
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if let Some(token) = tokens.get(index) {
            weight = token.parse::<f64>().ok().or(weight);
        }
    }

    weight.ok_or_else(|| {
        DssatError::computation(
            "RUN.GROWTH_TABLE",
            format!("growth file has no parseable {GRAIN_WEIGHT_COLUMN} column"),
        )
    })
}

/// One region's yield rows after a full ensemble run.
#[derive(Debug, Clone)]
pub struct YieldSummary {
    pub rows: usize,
    pub labeled: u64,
    pub mean_grain_weight: f64,
}

/// Operations on the `{schema}.yield` table.
pub struct YieldStore<'a> {
    pool: &'a PgPool,
    schema: &'a str,
}

impl<'a> YieldStore<'a> {
    pub fn new(pool: &'a PgPool, schema: &'a str) -> DssatResult<Self> {
        schema_identifier(schema)?;
        Ok(Self { pool, schema })
    }

    pub async fn ensure_table(&self) -> DssatResult<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {schema}.yield \
             (gid bigint NOT NULL, ensemble integer NOT NULL, \
              harvested double precision NOT NULL, crop text)",
            schema = self.schema
        ))
        .execute(self.pool)
        .await
        .map_err(|source| table_error("DB.YIELD_TABLE", &source))?;
        Ok(())
    }

    pub async fn insert(
        &self,
        gid: i64,
        ensemble_index: usize,
        grain_weight: f64,
    ) -> DssatResult<()> {
        sqlx::query(&format!(
            "INSERT INTO {schema}.yield (gid, ensemble, harvested) VALUES ($1, $2, $3)",
            schema = self.schema
        ))
        .bind(gid)
        .bind(ensemble_index as i64 + 1)
        .bind(grain_weight)
        .execute(self.pool)
        .await
        .map_err(|source| table_error("DB.YIELD_INSERT", &source))?;
        Ok(())
    }

    /// Labels previously-unlabeled yield rows with the crop type.
    /// Returns the number of rows updated.
    pub async fn label_crop(&self, crop: CropKind) -> DssatResult<u64> {
        let result = sqlx::query(&format!(
            "UPDATE {schema}.yield SET crop = $1 WHERE crop IS NULL",
            schema = self.schema
        ))
        .bind(crop.as_str())
        .execute(self.pool)
        .await
        .map_err(|source| table_error("DB.YIELD_LABEL", &source))?;
        Ok(result.rows_affected())
    }
}

fn table_error(placeholder: &str, source: &sqlx::Error) -> DssatError {
    DssatError::database(placeholder, format!("yield table operation failed: {source}"))
}

/// Builds the yield table from the renamed growth files of one full
/// ensemble run, then labels the new rows with the crop type.
pub async fn build_yield_table(
    pool: &PgPool,
    schema: &str,
    instance_dir: &Path,
    gid: i64,
    ensemble_count: usize,
    crop: CropKind,
) -> DssatResult<YieldSummary> {
    let store = YieldStore::new(pool, schema)?;
    store.ensure_table().await?;

    let mut total = 0.0;
    for ensemble_index in 0..ensemble_count {
        let path = instance_dir.join(artifact_name(ensemble_index));
        let source = std::fs::read_to_string(&path).map_err(|source| {
            DssatError::io_system(
                "IO.GROWTH_FILE_READ",
                format!("failed to read growth file '{}': {}", path.display(), source),
            )
        })?;
        let grain_weight = final_grain_weight(&source)?;
        store.insert(gid, ensemble_index, grain_weight).await?;
        total += grain_weight;
    }

    let labeled = store.label_crop(crop).await?;
    tracing::info!(gid, labeled, "yield table labeled");

    Ok(YieldSummary {
        rows: ensemble_count,
        labeled,
        mean_grain_weight: if ensemble_count == 0 {
            0.0
        } else {
            total / ensemble_count as f64
        },
    })
}

#[cfg(test)]
mod tests {
    use super::final_grain_weight;

    const GROWTH_TABLE: &str = "*GROWTH ASPECTS OUTPUT FILE\r\n\
        @YEAR DOY   DAS   LAID  GWAD  RWAD\r\n\
         2009 121     0   0.00     0.    12\r\n\
         2009 150    29   2.10  1250.    94\r\n\
         2009 180    59   1.80  4382.   101\r\n";

    #[test]
    fn final_grain_weight_reads_the_last_data_row() {
        let weight = final_grain_weight(GROWTH_TABLE).expect("table should parse");
        assert!((weight - 4382.0).abs() < 1.0e-9);
    }

    #[test]
    fn growth_file_without_header_is_rejected() {
        let error = final_grain_weight("no header here\r\n 1 2 3\r\n")
            .expect_err("headerless table should fail");
        assert_eq!(error.placeholder(), "RUN.GROWTH_TABLE");
    }

    #[test]
    fn short_trailing_rows_keep_the_previous_value() {
        let source = "@YEAR GWAD\r\n2009 100.\r\n2009\r\n";
        let weight = final_grain_weight(source).expect("table should parse");
        assert!((weight - 100.0).abs() < 1.0e-9);
    }
}
