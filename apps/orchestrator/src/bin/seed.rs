// [apps/orchestrator/src/bin/seed.rs]
/*!
 * =================================================================
 * APARATO: LOCAL FIXTURE SEEDER (V4.1 - DEV CORPUS)
 * CLASIFICACIÓN: OPERATIONS BINARY (ESTRATO L4)
 * RESPONSABILIDAD: CORPUS MÍNIMO PARA DESARROLLO LOCAL
 *
 * Inyecta un micro-corpus coherente (permisos, contactos de las tres
 * fuentes, ruteo, inspecciones, violaciones y directorio de
 * estaciones) listo para ejercitar el pipeline completo en local.
 * =================================================================
 */

use catastro_domain_models::{
    AddendaRouting, Contact, ContactRole, ContactSource, Inspection, Permit, Violation,
};
use catastro_infra_db::repositories::{
    AddendaRepository, ContactRepository, InspectionRepository, PermitRepository,
    ViolationRepository,
};
use catastro_infra_db::TursoClient;
use catastro_shared_atalaya::init_tracing;
use chrono::NaiveDate;
use clap::Parser;
use dotenvy::dotenv;
use libsql::params;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Siembra el corpus mínimo de desarrollo")]
struct SeedArgs {
    /// Cadena de conexión del almacén (default: DATABASE_URL).
    #[arg(long, env = "DATABASE_URL", default_value = "file:catastro_dev.db")]
    db_url: String,
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn fixture_contact(
    source: ContactSource,
    permit_number: &str,
    position: i64,
    role: ContactRole,
    name: &str,
    firm: Option<&str>,
    pts_agent_id: Option<&str>,
    license_number: Option<&str>,
) -> Contact {
    Contact {
        id: 0,
        source,
        permit_number: permit_number.to_string(),
        position,
        role,
        name: name.to_string(),
        first_name: None,
        last_name: None,
        firm_name: firm.map(str::to_string),
        pts_agent_id: pts_agent_id.map(str::to_string),
        license_number: license_number.map(str::to_string),
        sf_business_license: None,
        phone: None,
        street_number: None,
        street_name: None,
        city: None,
        state: None,
        zip: None,
        is_applicant: position == 0,
        from_date: date(2023, 6, 1),
        entity_id: None,
        data_as_of: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("catastro_seed");

    let args = SeedArgs::parse();
    let client = TursoClient::connect(&args.db_url, None).await?;

    // --- PERMISOS ---
    let permits = vec![
        Permit {
            permit_number: "202304015555".into(),
            permit_type: Some("additions alterations or repairs".into()),
            status: Some("issued".into()),
            status_date: date(2023, 8, 15),
            filed_date: date(2023, 4, 1),
            issued_date: date(2023, 8, 15),
            approved_date: date(2023, 8, 1),
            completed_date: None,
            estimated_cost: Some(450_000.0),
            street_number: Some("1455".into()),
            street_name: Some("MARKET".into()),
            neighborhood: Some("South of Market".into()),
            block: Some("3512".into()),
            lot: Some("021".into()),
            data_as_of: None,
        },
        Permit {
            permit_number: "202304016666".into(),
            permit_type: Some("new construction".into()),
            status: Some("filed".into()),
            status_date: date(2024, 1, 10),
            filed_date: date(2024, 1, 10),
            issued_date: None,
            approved_date: None,
            completed_date: None,
            estimated_cost: Some(2_500_000.0),
            street_number: Some("300".into()),
            street_name: Some("VALENCIA".into()),
            neighborhood: Some("Mission".into()),
            block: Some("3553".into()),
            lot: Some("008".into()),
            data_as_of: None,
        },
    ];
    PermitRepository::new(client.clone())
        .batch_upsert_permits(&permits)
        .await?;

    // --- CONTACTOS (las tres fuentes, mismo actor encadenado) ---
    let contacts = vec![
        fixture_contact(
            ContactSource::Building,
            "202304015555",
            0,
            ContactRole::Contractor,
            "ACME BUILDERS INC",
            Some("ACME BUILDERS INC"),
            Some("P-9001"),
            Some("L-777"),
        ),
        fixture_contact(
            ContactSource::Electrical,
            "202304015555",
            0,
            ContactRole::Contractor,
            "ACME BUILDERS INC",
            Some("ACME BUILDERS INC"),
            None,
            Some("L-777"),
        ),
        fixture_contact(
            ContactSource::Plumbing,
            "202304016666",
            0,
            ContactRole::Contractor,
            "ACME BUILDERS INC",
            Some("ACME BUILDERS INC"),
            None,
            Some("L-777"),
        ),
        fixture_contact(
            ContactSource::Building,
            "202304015555",
            1,
            ContactRole::Architect,
            "RIVERA DESIGN STUDIO",
            Some("RIVERA DESIGN STUDIO"),
            Some("P-9002"),
            None,
        ),
        fixture_contact(
            ContactSource::Building,
            "202304016666",
            0,
            ContactRole::Architect,
            "RIVERA DESIGN STUDIO",
            Some("RIVERA DESIGN STUDIO"),
            Some("P-9002"),
            None,
        ),
    ];
    ContactRepository::new(client.clone())
        .batch_upsert_contacts(&contacts)
        .await?;

    // --- RUTEO DE ADDENDA ---
    let routing = vec![
        AddendaRouting {
            id: 0,
            permit_number: "202304016666".into(),
            station: Some("BLDG".into()),
            addenda_number: 0,
            arrive_date: date(2024, 2, 1),
            finish_date: None,
            review_result: None,
            hold_description: None,
            reviewer: Some("J SANTOS".into()),
            data_as_of: None,
        },
        AddendaRouting {
            id: 0,
            permit_number: "202304015555".into(),
            station: Some("BLDG".into()),
            addenda_number: 0,
            arrive_date: date(2023, 5, 1),
            finish_date: date(2023, 5, 20),
            review_result: Some("Approved".into()),
            hold_description: None,
            reviewer: Some("J SANTOS".into()),
            data_as_of: None,
        },
        AddendaRouting {
            id: 0,
            permit_number: "202304015555".into(),
            station: Some("CP-ZOC".into()),
            addenda_number: 0,
            arrive_date: date(2023, 5, 21),
            finish_date: date(2023, 6, 18),
            review_result: Some("Approved".into()),
            hold_description: None,
            reviewer: Some("M WU".into()),
            data_as_of: None,
        },
    ];
    AddendaRepository::new(client.clone())
        .batch_upsert_routing(&routing)
        .await?;

    // --- INSPECCIONES ---
    let inspections = vec![Inspection {
        id: 0,
        reference_number: "202304015555".into(),
        inspection_type: Some("BUILDING FINAL".into()),
        inspector: Some("K OROZCO".into()),
        inspection_date: date(2023, 12, 5),
        result: Some("PASSED".into()),
        data_as_of: None,
    }];
    InspectionRepository::new(client.clone())
        .batch_upsert_inspections(&inspections)
        .await?;

    // --- VIOLACIONES ---
    let violations = vec![Violation {
        id: 0,
        complaint_number: Some("NOV-2024-0101".into()),
        status: Some("open".into()),
        nov_category: Some("work without permit".into()),
        block: Some("3553".into()),
        lot: Some("008".into()),
        street_number: Some("300".into()),
        street_name: Some("VALENCIA".into()),
        date_filed: date(2024, 3, 3),
        data_as_of: None,
    }];
    ViolationRepository::new(client.clone())
        .batch_upsert_violations(&violations)
        .await?;

    // --- DIRECTORIO DE ESTACIONES (fuente de contactos del playbook) ---
    let connection = client.get_connection()?;
    for (station, contact_name, contact_channel) in [
        ("BLDG", "Plan Check Desk", "permitcenter@sfgov.example"),
        ("CP-ZOC", "Planning Zoning Desk", "pic@sfplanning.example"),
        ("SFFD", "Fire Plan Review", "fire.plancheck@sfgov.example"),
    ] {
        connection
            .execute(
                r#"
                INSERT INTO station_directory (station, contact_name, contact_channel)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(station) DO UPDATE SET
                    contact_name = excluded.contact_name,
                    contact_channel = excluded.contact_channel
                "#,
                params![station, contact_name, contact_channel],
            )
            .await?;
    }

    info!(
        "🌱 [SEED]: Dev corpus planted ({} permits, {} contacts, {} routing rows).",
        permits.len(),
        contacts.len(),
        routing.len()
    );
    Ok(())
}
