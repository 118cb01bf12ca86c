// [libs/infra/db-turso/src/schema.rs]
/**
 * =================================================================
 * APARATO: ANALYTICAL DATABASE SCHEMA (V12.3 - PERMIT STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. RAW VS DERIVED: Las tablas crudas (contacts, permits,
 *    inspections, addenda_routing, violations) se upsertean in-place;
 *    las derivadas (entities, relationships, velocity_baseline,
 *    *_signals) siguen la disciplina rebuild-then-swap.
 * 2. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * 3. PERFORMANCE: Índices de aceleración para el self-join del grafo
 *    y la cascada de resolución.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del almacén analítico Catastro.
 */
const ANALYTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_CONTACTS", r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            permit_number TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            role TEXT NOT NULL DEFAULT 'other',
            name TEXT NOT NULL DEFAULT '',
            first_name TEXT,
            last_name TEXT,
            firm_name TEXT,
            pts_agent_id TEXT,
            license_number TEXT,
            sf_business_license TEXT,
            phone TEXT,
            street_number TEXT,
            street_name TEXT,
            city TEXT,
            state TEXT,
            zip TEXT,
            is_applicant INTEGER NOT NULL DEFAULT 0,
            from_date TEXT,
            entity_id INTEGER,
            data_as_of TEXT,
            UNIQUE(source, permit_number, position)
        );
    "#),
    ("TABLE_PERMITS", r#"
        CREATE TABLE IF NOT EXISTS permits (
            permit_number TEXT PRIMARY KEY,
            permit_type TEXT,
            status TEXT,
            status_date TEXT,
            filed_date TEXT,
            issued_date TEXT,
            approved_date TEXT,
            completed_date TEXT,
            estimated_cost REAL,
            street_number TEXT,
            street_name TEXT,
            neighborhood TEXT,
            block TEXT,
            lot TEXT,
            data_as_of TEXT
        );
    "#),
    ("TABLE_INSPECTIONS", r#"
        CREATE TABLE IF NOT EXISTS inspections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reference_number TEXT NOT NULL,
            inspection_type TEXT,
            inspector TEXT,
            inspection_date TEXT,
            result TEXT,
            data_as_of TEXT,
            UNIQUE(reference_number, inspection_type, inspection_date)
        );
    "#),
    ("TABLE_ADDENDA_ROUTING", r#"
        CREATE TABLE IF NOT EXISTS addenda_routing (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            permit_number TEXT NOT NULL,
            station TEXT,
            addenda_number INTEGER NOT NULL DEFAULT 0,
            arrive_date TEXT,
            finish_date TEXT,
            review_result TEXT,
            hold_description TEXT,
            reviewer TEXT,
            data_as_of TEXT,
            UNIQUE(permit_number, station, addenda_number, arrive_date)
        );
    "#),
    ("TABLE_VIOLATIONS", r#"
        CREATE TABLE IF NOT EXISTS violations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            complaint_number TEXT UNIQUE,
            status TEXT,
            nov_category TEXT,
            block TEXT,
            lot TEXT,
            street_number TEXT,
            street_name TEXT,
            date_filed TEXT,
            data_as_of TEXT
        );
    "#),
    ("TABLE_ENTITIES", r#"
        CREATE TABLE IF NOT EXISTS entities (
            entity_id INTEGER PRIMARY KEY,
            canonical_name TEXT NOT NULL DEFAULT '',
            canonical_firm TEXT,
            entity_type TEXT NOT NULL DEFAULT 'other',
            pts_agent_id TEXT,
            license_number TEXT,
            sf_business_license TEXT,
            resolution_method TEXT NOT NULL,
            resolution_confidence TEXT NOT NULL,
            contact_count INTEGER NOT NULL DEFAULT 0,
            permit_count INTEGER NOT NULL DEFAULT 0,
            source_datasets TEXT NOT NULL DEFAULT ''
        );
    "#),
    ("TABLE_ENTITY_ASSIGNMENTS", r#"
        CREATE TABLE IF NOT EXISTS entity_assignments (
            contact_id INTEGER PRIMARY KEY,
            entity_id INTEGER NOT NULL
        );
    "#),
    ("TABLE_RELATIONSHIPS", r#"
        CREATE TABLE IF NOT EXISTS relationships (
            entity_id_a INTEGER NOT NULL,
            entity_id_b INTEGER NOT NULL,
            shared_permits INTEGER NOT NULL,
            permit_numbers TEXT,
            permit_types TEXT,
            date_range_start TEXT,
            date_range_end TEXT,
            total_estimated_cost REAL NOT NULL DEFAULT 0,
            neighborhoods TEXT,
            PRIMARY KEY (entity_id_a, entity_id_b)
        );
    "#),
    ("TABLE_VELOCITY_BASELINE", r#"
        CREATE TABLE IF NOT EXISTS velocity_baseline (
            station TEXT NOT NULL,
            neighborhood TEXT NOT NULL DEFAULT '',
            period TEXT NOT NULL,
            cycle_type TEXT NOT NULL,
            window_days INTEGER NOT NULL,
            sample_count INTEGER NOT NULL,
            p25 REAL NOT NULL,
            p50 REAL NOT NULL,
            p75 REAL NOT NULL,
            p90 REAL NOT NULL,
            low_confidence INTEGER NOT NULL DEFAULT 0,
            computed_at TEXT NOT NULL,
            PRIMARY KEY (station, neighborhood, period, cycle_type)
        );
    "#),
    ("TABLE_PERMIT_SIGNALS", r#"
        CREATE TABLE IF NOT EXISTS permit_signals (
            permit_number TEXT PRIMARY KEY,
            hold_comments INTEGER NOT NULL DEFAULT 0,
            hold_stalled INTEGER NOT NULL DEFAULT 0,
            expired_uninspected INTEGER NOT NULL DEFAULT 0,
            stale_with_activity INTEGER NOT NULL DEFAULT 0,
            evidence TEXT NOT NULL DEFAULT '[]'
        );
    "#),
    ("TABLE_PROPERTY_SIGNALS", r#"
        CREATE TABLE IF NOT EXISTS property_signals (
            property_key TEXT PRIMARY KEY,
            block TEXT,
            lot TEXT,
            street_number TEXT,
            street_name TEXT,
            permit_count INTEGER NOT NULL DEFAULT 0,
            open_violation_count INTEGER NOT NULL DEFAULT 0,
            signal_kinds TEXT NOT NULL DEFAULT '',
            compound_pattern TEXT NOT NULL DEFAULT '',
            health TEXT NOT NULL DEFAULT 'QUIET'
        );
    "#),
    ("TABLE_INGEST_LOG", r#"
        CREATE TABLE IF NOT EXISTS ingest_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'running',
            started_at TEXT NOT NULL,
            finished_at TEXT,
            rows_fetched INTEGER NOT NULL DEFAULT 0,
            rows_upserted INTEGER NOT NULL DEFAULT 0,
            rows_skipped INTEGER NOT NULL DEFAULT 0,
            error_message TEXT
        );
    "#),
    ("TABLE_CRON_LOG", r#"
        CREATE TABLE IF NOT EXISTS cron_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            step TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'running',
            started_at TEXT NOT NULL,
            finished_at TEXT,
            records_affected INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            max_wall_clock_seconds INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_API_USAGE_LOG", r#"
        CREATE TABLE IF NOT EXISTS api_usage_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            endpoint TEXT NOT NULL,
            status_code INTEGER NOT NULL DEFAULT 200,
            observed_at TEXT NOT NULL
        );
    "#),
    ("TABLE_API_USAGE_DAILY", r#"
        CREATE TABLE IF NOT EXISTS api_usage_daily (
            usage_date TEXT NOT NULL,
            endpoint TEXT NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (usage_date, endpoint)
        );
    "#),
    ("TABLE_STATION_DIRECTORY", r#"
        CREATE TABLE IF NOT EXISTS station_directory (
            station TEXT PRIMARY KEY,
            contact_name TEXT,
            contact_channel TEXT
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a nuevas capacidades.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("CRON_WALL_CLOCK", "ALTER TABLE cron_log ADD COLUMN max_wall_clock_seconds INTEGER NOT NULL DEFAULT 0"),
    ("PERMIT_APPROVED", "ALTER TABLE permits ADD COLUMN approved_date TEXT"),
    ("ADDENDA_HOLD", "ALTER TABLE addenda_routing ADD COLUMN hold_description TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza la cascada de resolución y el self-join del grafo.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_CONTACTS_PERMIT", "CREATE INDEX IF NOT EXISTS idx_contacts_permit ON contacts(permit_number);"),
    ("IDX_CONTACTS_PTS", "CREATE INDEX IF NOT EXISTS idx_contacts_pts_agent ON contacts(pts_agent_id);"),
    ("IDX_CONTACTS_LICENSE", "CREATE INDEX IF NOT EXISTS idx_contacts_license ON contacts(license_number);"),
    ("IDX_CONTACTS_SF_LICENSE", "CREATE INDEX IF NOT EXISTS idx_contacts_sf_license ON contacts(sf_business_license);"),
    ("IDX_CONTACTS_ENTITY", "CREATE INDEX IF NOT EXISTS idx_contacts_entity ON contacts(entity_id);"),
    ("IDX_ADDENDA_DEDUP", "CREATE INDEX IF NOT EXISTS idx_addenda_dedup ON addenda_routing(permit_number, station, addenda_number);"),
    ("IDX_INSPECTIONS_REFERENCE", "CREATE INDEX IF NOT EXISTS idx_inspections_reference ON inspections(reference_number);"),
    ("IDX_INSPECTIONS_INSPECTOR", "CREATE INDEX IF NOT EXISTS idx_inspections_inspector ON inspections(inspector);"),
    ("IDX_PERMITS_PARCEL", "CREATE INDEX IF NOT EXISTS idx_permits_parcel ON permits(block, lot);"),
    ("IDX_VIOLATIONS_PARCEL", "CREATE INDEX IF NOT EXISTS idx_violations_parcel ON violations(block, lot);"),
    ("IDX_CRON_RUN", "CREATE INDEX IF NOT EXISTS idx_cron_run ON cron_log(run_id);"),
    ("IDX_INGEST_DATASET", "CREATE INDEX IF NOT EXISTS idx_ingest_dataset ON ingest_log(dataset_id, status);"),
];

/// Índices UNIQUE de los almacenes derivados. Se re-aplican tras cada
/// swap porque el rename arrastra los índices a la tabla retirada.
pub const DERIVED_ENTITY_INDEXES: &[(&str, &str)] = &[
    ("IDX_ENTITIES_PTS", "CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_pts_agent ON entities(pts_agent_id) WHERE pts_agent_id IS NOT NULL;"),
    ("IDX_ENTITIES_LICENSE", "CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_license ON entities(license_number) WHERE license_number IS NOT NULL;"),
    ("IDX_ENTITIES_SF_LICENSE", "CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_sf_license ON entities(sf_business_license) WHERE sf_business_license IS NOT NULL;"),
    ("IDX_ENTITIES_NAME", "CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(canonical_name);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_analytical_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V12.3...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Analytical Ledger V12.3 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in ANALYTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES.iter().chain(DERIVED_ENTITY_INDEXES) {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
