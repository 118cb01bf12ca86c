// [apps/orchestrator/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: PERIMETER GUARD STACK (V4.1 - BEARER SOBERANO)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: AUTORIZACIÓN BEARER, SALUD Y RASTRO DE USO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ZERO BODY LEAKAGE: Las peticiones no autorizadas reciben un 401
 *    sin cuerpo; ni diagnóstico ni eco del token.
 * 2. HEALTH GATE: El modo Maintenance responde 503 con retry_after.
 * 3. USAGE TRAIL: Cada hit de la superficie queda contado en el
 *    ledger de uso (fire-and-forget, fuera del camino caliente).
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

/// Guardia de Salud: bloquea el acceso si el sistema está en mantenimiento.
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!("⛔ [ACCESS_DENIED]: Sector under maintenance: {}", reason);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "STRATA_MAINTENANCE_ACTIVE",
                "reason": reason,
                "retry_after": 60
            })),
        )
            .into_response();
    }
    next.run(req).await
}

/// Guardia de Autorización: valida el secreto bearer del operador.
///
/// # Logic:
/// 1. Cabecera Authorization con esquema Bearer obligatoria.
/// 2. Igualdad exacta contra CRON_SECRET -> paso franco.
/// 3. En otro caso -> 401 sin cuerpo (cero fuga de diagnóstico).
pub async fn auth_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header_content = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header_value| header_value.to_str().ok());

    let presented_token = match auth_header_content {
        Some(header_value) if header_value.starts_with("Bearer ") => &header_value[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    if presented_token == state.config.cron_secret {
        debug!("🔐 [AUTH]: Bearer secret accepted.");
        return Ok(next.run(req).await);
    }

    warn!("❌ [AUTH_REJECTION]: Invalid bearer secret presented.");
    Err(StatusCode::UNAUTHORIZED)
}

/// Rastro de uso: contabiliza cada hit fuera del camino caliente.
pub async fn usage_recorder(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let endpoint_path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status_code = response.status().as_u16() as i64;

    let usage_repository = state.api_usage_repository.clone();
    tokio::spawn(async move {
        if let Err(ledger_fault) = usage_repository
            .record_hit(&endpoint_path, status_code, Utc::now())
            .await
        {
            debug!("Usage ledger write skipped: {}", ledger_fault);
        }
    });

    response
}
