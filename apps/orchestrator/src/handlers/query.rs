// [apps/orchestrator/src/handlers/query.rs]
/*!
 * =================================================================
 * APARATO: QUERY SURFACE HANDLERS (V4.3 - STABLE ERROR KINDS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: ADAPTACIÓN HTTP DE LAS OPERACIONES DE CONSULTA
 *
 * Contrato de error: tipo estable legible por máquina + mensaje
 * humano corto. Ningún stack trace atraviesa esta superficie.
 * =================================================================
 */

use crate::queries::QueryService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catastro_domain_models::QueryError;
use serde::Deserialize;
use serde_json::json;

/// Envoltura de fallo con mapeo estable a status HTTP.
pub struct ApiFault(pub QueryError);

impl IntoResponse for ApiFault {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error_kind": self.0.kind(),
            "message": self.0.to_string(),
        });
        if matches!(self.0, QueryError::Unavailable(_)) {
            body["retry_after"] = json!(2);
        }

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiFault {
    fn from(fault: QueryError) -> Self {
        ApiFault(fault)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NetworkParams {
    pub hops: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct InspectorParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ClusterParams {
    pub min_size: Option<usize>,
    pub min_weight: Option<i64>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnomalyParams {
    pub min_permits: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyParams {
    pub block: Option<String>,
    pub lot: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineRequest {
    pub permit_type: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    pub neighborhood: Option<String>,
    pub monthly_carrying_cost: Option<f64>,
}

pub struct QuerySurfaceHandler;

impl QuerySurfaceHandler {
    /// GET /api/v1/query/entity/search?q=&type=
    pub async fn handle_entity_search(
        State(state): State<AppState>,
        Query(params): Query<SearchParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let hits = QueryService::new(state)
            .search_entity(&params.q, params.entity_type.as_deref())
            .await?;
        Ok(Json(json!({ "results": hits })))
    }

    /// GET /api/v1/query/entity/:entity_id/network?hops=
    pub async fn handle_entity_network(
        State(state): State<AppState>,
        Path(entity_id): Path<i64>,
        Query(params): Query<NetworkParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let graph = QueryService::new(state)
            .entity_network(entity_id, params.hops.unwrap_or(2))
            .await?;
        Ok(Json(graph))
    }

    /// GET /api/v1/query/links/inspector?name=
    pub async fn handle_inspector_links(
        State(state): State<AppState>,
        Query(params): Query<InspectorParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let links = QueryService::new(state)
            .inspector_contractor_links(&params.name)
            .await?;

        let payload: Vec<_> = links
            .into_iter()
            .map(|(entity, shared_permits)| {
                json!({ "entity": entity, "shared_permits": shared_permits })
            })
            .collect();
        Ok(Json(json!({ "links": payload })))
    }

    /// GET /api/v1/query/clusters?min_size=&min_weight=&type=
    pub async fn handle_find_clusters(
        State(state): State<AppState>,
        Query(params): Query<ClusterParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let clusters = QueryService::new(state)
            .find_clusters(
                params.min_size.unwrap_or(3),
                params.min_weight.unwrap_or(2),
                params.entity_type.as_deref(),
            )
            .await?;
        Ok(Json(json!({ "clusters": clusters })))
    }

    /// GET /api/v1/query/anomalies?min_permits=
    pub async fn handle_anomaly_scan(
        State(state): State<AppState>,
        Query(params): Query<AnomalyParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let report = QueryService::new(state)
            .anomaly_scan(params.min_permits.unwrap_or(10))
            .await?;
        Ok(Json(report))
    }

    /// GET /api/v1/query/permit/:permit_number/diagnosis
    pub async fn handle_stuck_diagnosis(
        State(state): State<AppState>,
        Path(permit_number): Path<String>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let diagnosis = QueryService::new(state)
            .diagnose_stuck_permit(&permit_number)
            .await?;
        Ok(Json(diagnosis))
    }

    /// POST /api/v1/query/timeline
    pub async fn handle_timeline_estimate(
        State(state): State<AppState>,
        Json(request): Json<TimelineRequest>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let estimate = QueryService::new(state)
            .estimate_timeline(
                &request.permit_type,
                &request.triggers,
                request.neighborhood.as_deref(),
                request.monthly_carrying_cost,
            )
            .await?;
        Ok(Json(estimate))
    }

    /// GET /api/v1/query/property/health?block=&lot=
    pub async fn handle_property_health(
        State(state): State<AppState>,
        Query(params): Query<PropertyParams>,
    ) -> Result<impl IntoResponse, ApiFault> {
        let summary = QueryService::new(state)
            .property_health(
                params.block.as_deref(),
                params.lot.as_deref(),
                params.street_number.as_deref(),
                params.street_name.as_deref(),
            )
            .await?;
        Ok(Json(summary))
    }
}
