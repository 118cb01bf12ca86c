// [tests/mirror/apps/orchestrator/queries/stuck_diagnosis.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL DIAGNÓSTICO DE ATASCOS (V2.2 - PLAYBOOK)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: CLASIFICACIÓN NORMAL/SLOW/STUCK Y PLAYBOOK ORDENADO
 *
 * Garantías: una estación jamás se reporta 'stuck' sin muestra
 * suficiente en la velocidad current, y el playbook solo toma
 * contactos del directorio configurado.
 * =================================================================
 */

use catastro_domain_models::{
    BaselinePeriod, CycleType, Permit, PlaybookUrgency, QueryError, StationPace, VelocityBaseline,
};
use catastro_infra_db::TursoClient;
use catastro_orchestrator::config::OperatorConfig;
use catastro_orchestrator::queries::QueryService;
use catastro_orchestrator::state::AppState;
use chrono::{Duration, Utc};
use libsql::params;

fn test_config() -> OperatorConfig {
    OperatorConfig {
        db_url: "unused-in-tests".into(),
        db_auth_token: None,
        portal_base_url: "http://127.0.0.1:9".into(),
        source_app_token: None,
        cron_secret: "test-secret".into(),
        admin_email: None,
        ingest_overlap_days: 2,
        max_parallel_ingest: 3,
        rate_limit_qps: None,
        velocity_current_window_days: 90,
        velocity_auto_widen_days: 180,
        staleness_alarm_days: 3,
        listening_port: 0,
    }
}

fn baseline(
    station: &str,
    period: BaselinePeriod,
    p50: f64,
    p75: f64,
    sample_count: i64,
) -> VelocityBaseline {
    VelocityBaseline {
        station: station.to_string(),
        neighborhood: None,
        period,
        cycle_type: CycleType::Initial,
        window_days: 90,
        sample_count,
        p25: p50 * 0.6,
        p50,
        p75,
        p90: p75 * 1.5,
        low_confidence: sample_count < 30,
        computed_at: Utc::now(),
    }
}

async fn diagnostic_state(memory_label: &str, station_samples: i64) -> AppState {
    let database_client = TursoClient::connect(
        &format!("file:{}?mode=memory&cache=shared", memory_label),
        None,
    )
    .await
    .expect("CRITICAL_FAULT: in-memory analytical store refused to open.");
    let state = AppState::new(database_client, test_config()).unwrap();

    state
        .permit_repository
        .batch_upsert_permits(&[Permit {
            permit_number: "202404010001".into(),
            permit_type: Some("new construction".into()),
            status: Some("filed".into()),
            status_date: None,
            filed_date: None,
            issued_date: None,
            approved_date: None,
            completed_date: None,
            estimated_cost: Some(900_000.0),
            street_number: None,
            street_name: None,
            neighborhood: Some("Mission".into()),
            block: None,
            lot: None,
            data_as_of: None,
        }])
        .await
        .unwrap();

    // Estación S abierta hace 60 días, con revisor asignado.
    let arrived = (Utc::now().date_naive() - Duration::days(60)).to_string();
    state
        .database_client
        .get_connection()
        .unwrap()
        .execute(
            r#"
            INSERT INTO addenda_routing (permit_number, station, addenda_number, arrive_date, reviewer)
            VALUES ('202404010001', 'BLDG', 0, ?1, 'J SANTOS')
            "#,
            params![arrived],
        )
        .await
        .unwrap();

    state
        .velocity_repository
        .replace_baselines(&[
            baseline("BLDG", BaselinePeriod::Current, 20.0, 35.0, station_samples),
            baseline("BLDG", BaselinePeriod::Baseline, 16.0, 30.0, 200),
        ])
        .await
        .unwrap();

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario canónico: 60 días contra p50=20 -> STUCK inmediato,
    /// con el revisor de la última fila de ruteo a la vista.
    #[tokio::test]
    async fn certify_stuck_classification_with_playbook() {
        println!("\n🩺 [INICIO]: Auditoría del diagnóstico de atascos...");

        let state = diagnostic_state("mem_diag_stuck_v22", 40).await;
        let service = QueryService::new(state);

        let diagnosis = service.diagnose_stuck_permit("202404010001").await.unwrap();

        assert_eq!(diagnosis.stations.len(), 1);
        let station = &diagnosis.stations[0];
        assert_eq!(station.station, "BLDG");
        assert_eq!(station.pace, StationPace::Stuck, ">= 2x p50 exige STUCK.");
        assert_eq!(station.reviewer.as_deref(), Some("J SANTOS"));
        assert!(station.days_at_station >= 59);

        let lead_step = &diagnosis.playbook[0];
        assert_eq!(lead_step.urgency, PlaybookUrgency::Immediate);
        assert!(lead_step.action.contains("BLDG"));
        assert!(lead_step.action.contains("J SANTOS"));
        assert_eq!(
            lead_step.contact, "via permit center directory",
            "Sin entrada de directorio, jamás se inventa un contacto."
        );

        println!("   ✅ STUCK certificado con playbook inmediato.");
    }

    /// Gate de muestra: con 5 muestras la estación NUNCA es stuck.
    #[tokio::test]
    async fn certify_stuck_requires_sample_floor() {
        let state = diagnostic_state("mem_diag_floor_v22", 5).await;
        let service = QueryService::new(state);

        let diagnosis = service.diagnose_stuck_permit("202404010001").await.unwrap();
        assert_eq!(
            diagnosis.stations[0].pace,
            StationPace::Normal,
            "5 muestras están bajo el piso de confianza."
        );
    }

    /// El contacto del playbook proviene del directorio configurado.
    #[tokio::test]
    async fn certify_directory_contact_resolution() {
        let state = diagnostic_state("mem_diag_directory_v22", 40).await;
        state
            .database_client
            .get_connection()
            .unwrap()
            .execute(
                r#"
                INSERT INTO station_directory (station, contact_name, contact_channel)
                VALUES ('BLDG', 'Plan Check Desk', 'permitcenter@sfgov.example')
                "#,
                (),
            )
            .await
            .unwrap();

        let service = QueryService::new(state);
        let diagnosis = service.diagnose_stuck_permit("202404010001").await.unwrap();
        assert_eq!(
            diagnosis.playbook[0].contact,
            "Plan Check Desk via permitcenter@sfgov.example"
        );
    }

    /// Permiso inexistente -> NotFound; inactivo -> BadRequest.
    #[tokio::test]
    async fn certify_diagnosis_error_kinds() {
        let state = diagnostic_state("mem_diag_errors_v22", 40).await;

        state
            .database_client
            .get_connection()
            .unwrap()
            .execute(
                "INSERT INTO permits (permit_number, status) VALUES ('DEAD-1', 'expired')",
                (),
            )
            .await
            .unwrap();

        let service = QueryService::new(state);
        assert!(matches!(
            service.diagnose_stuck_permit("MISSING").await,
            Err(QueryError::NotFound(_))
        ));
        assert!(matches!(
            service.diagnose_stuck_permit("DEAD-1").await,
            Err(QueryError::BadRequest(_))
        ));
    }
}
