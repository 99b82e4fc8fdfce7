//! Cultivar resolution against the spatial database.
//!
//! Queries are built at runtime and parameterized; only the schema name
//! is spliced in, after identifier validation, because identifiers
//! cannot be bound.

use super::CultivarRecord;
use crate::domain::{CropKind, DssatError, DssatResult, schema_identifier};
use sqlx::PgPool;

type CultivarRow = (f64, f64, f64, f64, f64, f64, f64, f64, String);

/// Operations on the `dssat.cultivars` table, scoped to one region
/// schema.
pub struct CultivarStore<'a> {
    pool: &'a PgPool,
    schema: &'a str,
}

impl<'a> CultivarStore<'a> {
    pub fn new(pool: &'a PgPool, schema: &'a str) -> DssatResult<Self> {
        schema_identifier(schema)?;
        Ok(Self { pool, schema })
    }

    /// Resolves the cultivar for one ensemble member and region.
    ///
    /// Exact spatial containment is preferred; when no cultivar polygon
    /// intersects the region, the nearest cultivar by centroid distance
    /// is taken instead. A miss on both paths is an error, never a
    /// default record.
    pub async fn resolve(
        &self,
        crop: CropKind,
        ensemble_index: usize,
        gid: i64,
    ) -> DssatResult<CultivarRecord> {
        let ensemble = ensemble_index as i64 + 1;

        let row: Option<CultivarRow> = sqlx::query_as(&self.intersect_query())
            .bind(crop.as_str())
            .bind(ensemble)
            .bind(gid)
            .fetch_optional(self.pool)
            .await
            .map_err(|source| query_error("DB.CULTIVAR_INTERSECT", gid, &source))?;

        let row = match row {
            Some(row) => row,
            None => sqlx::query_as(&self.nearest_query())
                .bind(crop.as_str())
                .bind(ensemble)
                .bind(gid)
                .fetch_optional(self.pool)
                .await
                .map_err(|source| query_error("DB.CULTIVAR_NEAREST", gid, &source))?
                .ok_or_else(|| {
                    DssatError::database(
                        "DB.CULTIVAR_EMPTY",
                        format!(
                            "no {} cultivar found for gid {} ensemble {}",
                            crop, gid, ensemble
                        ),
                    )
                })?,
        };

        let (p1, p2r, p5, p2o, g1, g2, g3, g4, name) = row;
        tracing::debug!(gid, ensemble, cultivar = %name, "resolved cultivar");
        Ok(CultivarRecord {
            p1,
            p2r,
            p5,
            p2o,
            g1,
            g2,
            g3,
            g4,
            name,
        })
    }

    fn intersect_query(&self) -> String {
        format!(
            "SELECT c.p1, c.p2r, c.p5, c.p2o, c.g1, c.g2, c.g3, c.g4, c.name \
             FROM dssat.cultivars AS c, {schema}.agareas AS a \
             WHERE c.crop = $1 AND c.ensemble = $2 \
               AND st_intersects(c.geom, a.geom) AND a.gid = $3",
            schema = self.schema
        )
    }

    fn nearest_query(&self) -> String {
        format!(
            "SELECT c.p1, c.p2r, c.p5, c.p2o, c.g1, c.g2, c.g3, c.g4, c.name \
             FROM dssat.cultivars AS c, {schema}.agareas AS a \
             WHERE c.crop = $1 AND c.ensemble = $2 AND a.gid = $3 \
             ORDER BY st_centroid(c.geom) <-> st_centroid(a.geom) \
             LIMIT 1",
            schema = self.schema
        )
    }
}

fn query_error(placeholder: &str, gid: i64, source: &sqlx::Error) -> DssatError {
    DssatError::database(
        placeholder,
        format!("cultivar query failed for gid {gid}: {source}"),
    )
}

#[cfg(test)]
mod tests {
    use super::CultivarStore;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/rheas")
            .expect("lazy pool should build without a live server")
    }

    #[tokio::test]
    async fn store_rejects_unsafe_schema_names() {
        let pool = lazy_pool();
        assert!(CultivarStore::new(&pool, "basin; drop table x").is_err());
        assert!(CultivarStore::new(&pool, "basin").is_ok());
    }

    #[tokio::test]
    async fn fallback_query_orders_by_centroid_distance() {
        let pool = lazy_pool();
        let store = CultivarStore::new(&pool, "basin").expect("valid schema");
        let primary = store.intersect_query();
        let fallback = store.nearest_query();

        assert!(primary.contains("st_intersects(c.geom, a.geom)"));
        assert!(!primary.contains("ORDER BY"));
        assert!(fallback.contains("ORDER BY st_centroid(c.geom) <-> st_centroid(a.geom)"));
        assert!(fallback.ends_with("LIMIT 1"));
        assert!(fallback.contains("basin.agareas"));
    }
}
