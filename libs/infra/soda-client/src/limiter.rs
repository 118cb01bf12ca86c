// [libs/infra/soda-client/src/limiter.rs]
/*!
 * =================================================================
 * APARATO: PORTAL RATE BUDGET (V4.0 - SHARED TOKEN BUCKET)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA DEL PRESUPUESTO DE TASA DEL PORTAL
 *
 * Un único bucket guarda TODAS las peticiones salientes al portal,
 * compartido entre los ingestores paralelos vía Arc. Sin QPS
 * configurado el bucket opera en modo passthrough.
 * =================================================================
 */

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::info;

/// Token bucket compartido del portal SODA.
pub struct PortalRateLimiter {
    bucket: Option<DefaultDirectRateLimiter>,
}

impl PortalRateLimiter {
    /// `rate_limit_qps = None` deshabilita la limitación (passthrough).
    pub fn new(rate_limit_qps: Option<u32>) -> Self {
        let bucket = rate_limit_qps
            .and_then(NonZeroU32::new)
            .map(|quota_per_second| {
                info!(
                    "🪣 [RATE_BUDGET]: Portal token bucket armed at {} req/s.",
                    quota_per_second
                );
                RateLimiter::direct(Quota::per_second(quota_per_second))
            });

        Self { bucket }
    }

    /// Suspende al worker hasta que el presupuesto libere un token.
    pub async fn acquire(&self) {
        if let Some(bucket) = &self.bucket {
            bucket.until_ready().await;
        }
    }
}
