// [libs/infra/db-turso/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V12.0 - REGISTRY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO NOMINAL DE ADAPTADORES DE PERSISTENCIA
 * =================================================================
 */

pub mod addenda;
pub mod analytics;
pub mod api_usage;
pub mod backup;
pub mod contacts;
pub mod cron_log;
pub mod entities;
pub mod ingest_log;
pub mod inspections;
pub mod permits;
pub mod relationships;
pub mod signals;
pub mod velocity;
pub mod violations;

pub use addenda::AddendaRepository;
pub use analytics::AnalyticsRepository;
pub use api_usage::ApiUsageRepository;
pub use backup::BackupRepository;
pub use contacts::ContactRepository;
pub use cron_log::CronLogRepository;
pub use entities::EntityRepository;
pub use ingest_log::IngestLogRepository;
pub use inspections::InspectionRepository;
pub use permits::PermitRepository;
pub use relationships::RelationshipRepository;
pub use signals::SignalRepository;
pub use velocity::VelocityRepository;
pub use violations::ViolationRepository;
