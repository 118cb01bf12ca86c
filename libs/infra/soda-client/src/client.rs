// [libs/infra/soda-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: SODA PORTAL UPLINK (V4.2 - PAGED SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PAGINACIÓN OFFSET/LIMIT Y REINTENTOS CON BACKOFF
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LAZY CURSOR: `PagedFetch` entrega páginas bajo demanda; el
 *    ingestor drena por ráfagas mientras la red y el disco solapan.
 * 2. RETRY DISCIPLINE: Backoff exponencial base 1s, factor 2, full
 *    jitter, máximo 6 intentos; Retry-After del servidor manda.
 * 3. NO CACHING: La idempotencia pertenece al upsert del ingestor.
 * =================================================================
 */

use crate::errors::SodaError;
use crate::limiter::PortalRateLimiter;
use crate::query::FetchQuery;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Tamaño fijo de página del portal.
pub const SODA_PAGE_SIZE: usize = 10_000;

/// Política de reintentos sobre fallos transitorios.
const MAX_RETRY_ATTEMPTS: u32 = 6;
const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Cabecera de credencial del portal para cuota elevada.
const APP_TOKEN_HEADER: &str = "x-app-token";

/// Cliente paginado del portal de datasets municipales.
pub struct SodaClient {
    network_session_client: Client,
    portal_base_endpoint: String,
    rate_budget: Arc<PortalRateLimiter>,
    delta_field: String,
}

impl SodaClient {
    /// Inicializa el uplink. El `app_token` viaja como cabecera en
    /// toda petición cuando la configuración lo provee.
    pub fn new(
        portal_base_url: &str,
        app_token: Option<String>,
        rate_budget: Arc<PortalRateLimiter>,
    ) -> Result<Self, SodaError> {
        let mut default_headers = HeaderMap::new();

        if let Some(token_value) = app_token {
            let header_value = HeaderValue::from_str(&token_value)
                .map_err(|_| SodaError::Fatal("CONFIG_FAULT: app token is not header-safe".into()))?;
            default_headers.insert(HeaderName::from_static(APP_TOKEN_HEADER), header_value);
            info!("🔑 [SODA_UPLINK]: App token armed for elevated rate tier.");
        }

        let network_client = Client::builder()
            .default_headers(default_headers)
            .user_agent("Catastro-Pipeline/V12")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|build_fault| {
                SodaError::Fatal(format!("CLIENT_IGNITION_FAILURE: {}", build_fault))
            })?;

        Ok(Self {
            network_session_client: network_client,
            portal_base_endpoint: portal_base_url.trim_end_matches('/').to_string(),
            rate_budget,
            delta_field: "data_as_of".to_string(),
        })
    }

    /// Abre un cursor paginado perezoso sobre un dataset.
    pub fn fetch(&self, dataset_id: &str, query: FetchQuery) -> PagedFetch<'_> {
        PagedFetch {
            client: self,
            dataset_id: dataset_id.to_string(),
            query,
            offset: 0,
            exhausted: false,
        }
    }

    /// Recupera una página con la política completa de reintentos.
    #[instrument(skip(self, query), fields(dataset = %dataset_id, offset))]
    pub async fn fetch_page(
        &self,
        dataset_id: &str,
        query: &FetchQuery,
        offset: usize,
    ) -> Result<Vec<Value>, SodaError> {
        let mut last_transient_fault: Option<SodaError> = None;

        for attempt_number in 1..=MAX_RETRY_ATTEMPTS {
            self.rate_budget.acquire().await;

            match self.execute_page_request(dataset_id, query, offset).await {
                Ok(records) => return Ok(records),
                Err(fault) if fault.is_transient() => {
                    let delay = compute_backoff_delay(attempt_number, fault.retry_after_seconds());
                    warn!(
                        "⚠️ [SODA_RETRY]: Attempt {}/{} degraded ({}). Backing off {:?}.",
                        attempt_number, MAX_RETRY_ATTEMPTS, fault, delay
                    );
                    last_transient_fault = Some(fault);
                    tokio::time::sleep(delay).await;
                }
                Err(fatal_fault) => return Err(fatal_fault),
            }
        }

        Err(last_transient_fault
            .unwrap_or_else(|| SodaError::transient("RETRY_BUDGET_EXHAUSTED")))
    }

    async fn execute_page_request(
        &self,
        dataset_id: &str,
        query: &FetchQuery,
        offset: usize,
    ) -> Result<Vec<Value>, SodaError> {
        let resource_url = format!("{}/resource/{}.json", self.portal_base_endpoint, dataset_id);

        let mut request_builder = self
            .network_session_client
            .get(&resource_url)
            .query(&[("$limit", SODA_PAGE_SIZE.to_string())])
            .query(&[("$offset", offset.to_string())]);

        if let Some(where_clause) = query.effective_where(&self.delta_field) {
            request_builder = request_builder.query(&[("$where", where_clause)]);
        }
        if let Some(order_clause) = &query.order {
            request_builder = request_builder.query(&[("$order", order_clause.clone())]);
        }

        let network_response = request_builder.send().await?;
        let http_status = network_response.status();

        if http_status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = network_response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|header| header.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());

            return Err(SodaError::Transient {
                detail: "HTTP_429_THROTTLED".into(),
                retry_after_seconds,
            });
        }

        if http_status.is_server_error() {
            return Err(SodaError::transient(format!("HTTP_{}", http_status)));
        }

        if http_status.is_client_error() {
            return Err(SodaError::Fatal(format!("HTTP_{}", http_status)));
        }

        let response_body: Value = network_response.json().await?;

        match response_body {
            Value::Array(records) => {
                debug!("  ↳ Page acquired: {} records at offset {}.", records.len(), offset);
                Ok(records)
            }
            other_shape => Err(SodaError::MalformedBody(format!(
                "expected JSON array, received {}",
                shape_label(&other_shape)
            ))),
        }
    }
}

/// Cursor perezoso sobre un dataset. El avance de offset y la
/// condición de parada (página corta) viven aquí.
pub struct PagedFetch<'a> {
    client: &'a SodaClient,
    dataset_id: String,
    query: FetchQuery,
    offset: usize,
    exhausted: bool,
}

impl PagedFetch<'_> {
    /// Entrega la siguiente página; None al agotar el dataset.
    /// La paginación se detiene cuando una página retorna menos
    /// registros que el tamaño de página.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, SodaError> {
        if self.exhausted {
            return Ok(None);
        }

        let page_records = self
            .client
            .fetch_page(&self.dataset_id, &self.query, self.offset)
            .await?;

        if page_records.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        if page_records.len() < SODA_PAGE_SIZE {
            self.exhausted = true;
        }
        self.offset += page_records.len();

        Ok(Some(page_records))
    }

    pub fn records_consumed(&self) -> usize {
        self.offset
    }
}

/// Backoff exponencial con full jitter. El Retry-After del servidor,
/// cuando existe, reemplaza el cálculo local.
fn compute_backoff_delay(attempt_number: u32, retry_after_seconds: Option<u64>) -> Duration {
    if let Some(server_mandated) = retry_after_seconds {
        return Duration::from_secs(server_mandated);
    }

    let exponential_ceiling_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << (attempt_number - 1));
    let jittered_ms = rand::thread_rng().gen_range(0..=exponential_ceiling_ms);
    Duration::from_millis(jittered_ms)
}

fn shape_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
