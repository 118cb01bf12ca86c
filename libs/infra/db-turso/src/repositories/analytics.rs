// [libs/infra/db-turso/src/repositories/analytics.rs]
/*!
 * =================================================================
 * APARATO: CROSS-TABLE ANALYTICS READER (V12.2 - READ ONLY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURAS MULTI-TABLA DE LA SUPERFICIE DE CONSULTA
 *
 * Los escaneos de anomalías reducen en SQL a agregados por entidad y
 * delegan el cálculo de ratios y medianas al estrato de dominio.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::PermitSummary;
use libsql::params;
use tracing::instrument;

/// Agregado (entidad, clave, permisos distintos) para los escaneos de
/// concentración.
#[derive(Debug, Clone)]
pub struct ConcentrationRow {
    pub entity_id: i64,
    pub canonical_name: String,
    pub entity_type: String,
    pub bucket_label: String,
    pub distinct_permits: i64,
}

/// Permiso con aprobación veloz y costo elevado.
#[derive(Debug, Clone)]
pub struct FastApprovalRow {
    pub entity_id: i64,
    pub canonical_name: String,
    pub entity_type: String,
    pub permit_number: String,
    pub approval_days: f64,
    pub estimated_cost: f64,
}

pub struct AnalyticsRepository {
    database_client: TursoClient,
}

impl AnalyticsRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Permisos recientes de una entidad (enriquecimiento de búsqueda).
    pub async fn recent_permits_for_entity(
        &self,
        entity_id: i64,
        limit: i64,
    ) -> Result<Vec<PermitSummary>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT DISTINCT p.permit_number, p.permit_type, p.status,
                       p.filed_date, p.neighborhood, p.estimated_cost
                FROM contacts c
                JOIN permits p ON p.permit_number = c.permit_number
                WHERE c.entity_id = ?1
                ORDER BY p.filed_date DESC
                LIMIT ?2
                "#,
                params![entity_id, limit],
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = result_rows.next().await? {
            summaries.push(PermitSummary {
                permit_number: rows::required_text(&row, 0)?,
                permit_type: rows::optional_text(&row, 1)?,
                status: rows::optional_text(&row, 2)?,
                filed_date: rows::optional_text(&row, 3)?,
                neighborhood: rows::optional_text(&row, 4)?,
                estimated_cost: rows::optional_real(&row, 5)?,
            });
        }
        Ok(summaries)
    }

    /// Trazado inspector -> permisos inspeccionados -> contactos ->
    /// entidades, con conteo de permisos compartidos.
    #[instrument(skip(self))]
    pub async fn inspector_contractor_links(
        &self,
        inspector_name: &str,
    ) -> Result<Vec<(i64, String, String, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT e.entity_id, e.canonical_name, e.entity_type,
                       COUNT(DISTINCT i.reference_number) AS shared_permits
                FROM inspections i
                JOIN contacts c ON c.permit_number = i.reference_number
                JOIN entities e ON e.entity_id = c.entity_id
                WHERE i.inspector = ?1
                GROUP BY e.entity_id, e.canonical_name, e.entity_type
                ORDER BY shared_permits DESC, e.entity_id ASC
                "#,
                params![inspector_name],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut links = Vec::new();
        while let Some(row) = result_rows.next().await? {
            links.push((
                rows::required_integer(&row, 0)?,
                rows::optional_text(&row, 1)?.unwrap_or_default(),
                rows::required_text(&row, 2)?,
                rows::required_integer(&row, 3)?,
            ));
        }
        Ok(links)
    }

    /// Volúmenes de permisos por entidad (insumo del escaneo de alto
    /// volumen; la mediana por tipo se computa en el dominio).
    pub async fn entity_permit_volumes(
        &self,
        min_permits: i64,
    ) -> Result<Vec<(i64, String, String, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT entity_id, canonical_name, entity_type, permit_count
                FROM entities
                WHERE permit_count >= ?1
                ORDER BY entity_type ASC, permit_count DESC
                "#,
                params![min_permits],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut volumes = Vec::new();
        while let Some(row) = result_rows.next().await? {
            volumes.push((
                rows::required_integer(&row, 0)?,
                rows::optional_text(&row, 1)?.unwrap_or_default(),
                rows::required_text(&row, 2)?,
                rows::required_integer(&row, 3)?,
            ));
        }
        Ok(volumes)
    }

    /// Todos los volúmenes por tipo (base de la mediana del escaneo).
    pub async fn permit_volumes_by_type(&self) -> Result<Vec<(String, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                "SELECT entity_type, permit_count FROM entities ORDER BY entity_type ASC",
                (),
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut volumes = Vec::new();
        while let Some(row) = result_rows.next().await? {
            volumes.push((
                rows::required_text(&row, 0)?,
                rows::required_integer(&row, 1)?,
            ));
        }
        Ok(volumes)
    }

    /// Concentración de inspector por entidad: (entidad, inspector,
    /// permisos inspeccionados distintos).
    #[instrument(skip(self))]
    pub async fn inspector_concentration_rows(
        &self,
        min_permits: i64,
    ) -> Result<Vec<ConcentrationRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT e.entity_id, e.canonical_name, e.entity_type,
                       i.inspector, COUNT(DISTINCT i.reference_number) AS distinct_permits
                FROM entities e
                JOIN contacts c ON c.entity_id = e.entity_id
                JOIN inspections i ON i.reference_number = c.permit_number
                WHERE e.permit_count >= ?1 AND i.inspector IS NOT NULL
                GROUP BY e.entity_id, i.inspector
                ORDER BY e.entity_id ASC
                "#,
                params![min_permits],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut concentration = Vec::new();
        while let Some(row) = result_rows.next().await? {
            concentration.push(ConcentrationRow {
                entity_id: rows::required_integer(&row, 0)?,
                canonical_name: rows::optional_text(&row, 1)?.unwrap_or_default(),
                entity_type: rows::required_text(&row, 2)?,
                bucket_label: rows::required_text(&row, 3)?,
                distinct_permits: rows::required_integer(&row, 4)?,
            });
        }
        Ok(concentration)
    }

    /// Concentración geográfica por entidad: (entidad, vecindario,
    /// permisos distintos).
    #[instrument(skip(self))]
    pub async fn geographic_concentration_rows(
        &self,
        min_permits: i64,
    ) -> Result<Vec<ConcentrationRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT e.entity_id, e.canonical_name, e.entity_type,
                       p.neighborhood, COUNT(DISTINCT p.permit_number) AS distinct_permits
                FROM entities e
                JOIN contacts c ON c.entity_id = e.entity_id
                JOIN permits p ON p.permit_number = c.permit_number
                WHERE e.permit_count >= ?1 AND p.neighborhood IS NOT NULL
                GROUP BY e.entity_id, p.neighborhood
                ORDER BY e.entity_id ASC
                "#,
                params![min_permits],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut concentration = Vec::new();
        while let Some(row) = result_rows.next().await? {
            concentration.push(ConcentrationRow {
                entity_id: rows::required_integer(&row, 0)?,
                canonical_name: rows::optional_text(&row, 1)?.unwrap_or_default(),
                entity_type: rows::required_text(&row, 2)?,
                bucket_label: rows::required_text(&row, 3)?,
                distinct_permits: rows::required_integer(&row, 4)?,
            });
        }
        Ok(concentration)
    }

    /// Aprobaciones veloces: emitido - presentado < umbral y costo alto.
    #[instrument(skip(self))]
    pub async fn fast_approval_rows(
        &self,
        max_approval_days: f64,
        min_estimated_cost: f64,
    ) -> Result<Vec<FastApprovalRow>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query(
                r#"
                SELECT DISTINCT e.entity_id, e.canonical_name, e.entity_type,
                       p.permit_number,
                       julianday(p.issued_date) - julianday(p.filed_date) AS approval_days,
                       p.estimated_cost
                FROM permits p
                JOIN contacts c ON c.permit_number = p.permit_number
                JOIN entities e ON e.entity_id = c.entity_id
                WHERE p.issued_date IS NOT NULL
                  AND p.filed_date IS NOT NULL
                  AND julianday(p.issued_date) - julianday(p.filed_date) < ?1
                  AND p.estimated_cost > ?2
                ORDER BY approval_days ASC, p.permit_number ASC
                "#,
                params![max_approval_days, min_estimated_cost],
            )
            .await
            .map_err(|fault| DbError::from(fault).reclassify_for_derived_read("entities"))?;

        let mut approvals = Vec::new();
        while let Some(row) = result_rows.next().await? {
            approvals.push(FastApprovalRow {
                entity_id: rows::required_integer(&row, 0)?,
                canonical_name: rows::optional_text(&row, 1)?.unwrap_or_default(),
                entity_type: rows::required_text(&row, 2)?,
                permit_number: rows::required_text(&row, 3)?,
                approval_days: rows::required_real(&row, 4)?,
                estimated_cost: rows::required_real(&row, 5)?,
            });
        }
        Ok(approvals)
    }

    /// Duraciones agregadas presentado->emitido para el fallback del
    /// estimador de cronogramas, con filtros progresivamente anchos.
    #[instrument(skip(self))]
    pub async fn approval_duration_samples(
        &self,
        permit_type: Option<&str>,
        neighborhood: Option<&str>,
    ) -> Result<Vec<f64>, DbError> {
        let connection = self.database_client.get_connection()?;

        let base_query = r#"
            SELECT julianday(issued_date) - julianday(filed_date) AS approval_days
            FROM permits
            WHERE issued_date IS NOT NULL AND filed_date IS NOT NULL
              AND julianday(issued_date) >= julianday(filed_date)
        "#;

        let query_result = match (permit_type, neighborhood) {
            (Some(type_filter), Some(neighborhood_filter)) => {
                let query = format!(
                    "{} AND permit_type = ?1 AND neighborhood = ?2",
                    base_query
                );
                connection
                    .query(
                        &query,
                        params![type_filter.to_string(), neighborhood_filter.to_string()],
                    )
                    .await
            }
            (Some(type_filter), None) => {
                let query = format!("{} AND permit_type = ?1", base_query);
                connection.query(&query, params![type_filter.to_string()]).await
            }
            (None, _) => connection.query(base_query, ()).await,
        };

        let mut result_rows = query_result?;
        let mut samples = Vec::new();
        while let Some(row) = result_rows.next().await? {
            if let Some(duration) = rows::optional_real(&row, 0)? {
                samples.push(duration);
            }
        }
        Ok(samples)
    }
}
