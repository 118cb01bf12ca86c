// [libs/shared/atalaya/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ATALAYA NEURAL OBSERVER (V5.0 - PERMIT STRATA)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: TELEMETRÍA ESTRUCTURADA Y CAPTURA DE PÁNICOS
 *
 * La atalaya arma el suscriptor global en dos perfiles (JSON plano
 * para la ingesta del Panóptico, compacto para el operador) y deja un
 * hook de pánico que preserva el rastro de cualquier colapso en hilos
 * secundarios, workers Rayon del resolver incluidos.
 * =================================================================
 */

use std::panic::{self, PanicInfo};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Pisos de ruido por crate de infraestructura: el dominio habla, la
/// plomería susurra.
const INFRA_NOISE_FLOORS: &[(&str, &str)] = &[
    ("tower_http", "warn"),
    ("hyper", "warn"),
    ("libsql", "error"),
    ("governor", "warn"),
    ("reqwest", "warn"),
];

/// Perfil de ejecución del proceso, derivado del tipo de build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuntimeProfile {
    /// Build release: tramas JSON planas para el Panóptico.
    Production,
    /// Build debug: salida compacta para la consola del operador.
    Development,
}

impl RuntimeProfile {
    fn detect() -> Self {
        if cfg!(debug_assertions) {
            RuntimeProfile::Development
        } else {
            RuntimeProfile::Production
        }
    }

    fn default_domain_level(&self) -> &'static str {
        match self {
            RuntimeProfile::Production => "info",
            RuntimeProfile::Development => "debug",
        }
    }
}

/// Ensambla el filtro: nivel del dominio propio + pisos de ruido de
/// infraestructura. `RUST_LOG` del operador manda cuando existe.
fn assemble_strata_filter(service_name: &str, profile: RuntimeProfile) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = vec![format!("{}={}", service_name, profile.default_domain_level())];
        for (infra_crate, noise_floor) in INFRA_NOISE_FLOORS {
            directives.push(format!("{}={}", infra_crate, noise_floor));
        }
        EnvFilter::new(directives.join(","))
    })
}

/// Describe un colapso para el rastro forense: ubicación, hilo y el
/// payload del pánico si es legible.
fn describe_panic(panic_info: &PanicInfo<'_>) -> (String, String, String) {
    let collapse_site = panic_info
        .location()
        .map(|site| format!("{}:{}", site.file(), site.line()))
        .unwrap_or_else(|| "<sitio desconocido>".to_string());

    let thread_label = std::thread::current()
        .name()
        .unwrap_or("<hilo sin nombre>")
        .to_string();

    let payload = panic_info.payload();
    let collapse_reason = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|reason| reason.to_string()))
        .unwrap_or_else(|| "<payload ilegible>".to_string());

    (collapse_site, thread_label, collapse_reason)
}

/// Levanta la atalaya: suscriptor global + hook de pánico forense.
///
/// # Errors:
/// Entra en pánico si otro suscriptor global ya fue inicializado en
/// el proceso; debe llamarse una única vez, antes del runtime.
pub fn init_tracing(service_name: &str) {
    let profile = RuntimeProfile::detect();
    let strata_filter = assemble_strata_filter(service_name, profile);

    let registry = tracing_subscriber::registry().with(strata_filter);
    match profile {
        RuntimeProfile::Production => {
            registry
                .with(fmt::layer().json().flatten_event(true))
                .init();
        }
        RuntimeProfile::Development => {
            registry
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
    }

    let watched_service = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let (collapse_site, thread_label, collapse_reason) = describe_panic(panic_info);
        error!(
            target: "atalaya::panic",
            service = %watched_service,
            thread = %thread_label,
            site = %collapse_site,
            "🔥 [COLAPSO]: A thread went down. Reason: {}",
            collapse_reason
        );
    }));

    info!(
        "👁️  [ATALAYA]: Watchtower raised for [{}] ({:?} profile).",
        service_name, profile
    );
}
