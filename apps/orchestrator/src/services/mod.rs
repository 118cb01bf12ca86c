// [apps/orchestrator/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICE STRATUM REGISTRY (V4.0)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: REGISTRO NOMINAL DE SERVICIOS DEL ORQUESTADOR
 * =================================================================
 */

pub mod ingest;
pub mod pipeline;
pub mod sentinel;
pub mod signal_refresh;
pub mod velocity_refresh;

pub use ingest::IngestService;
pub use pipeline::{PipelineRunner, PipelineStep, RunSummary, StepError};
pub use sentinel::spawn_staleness_sentinel;
