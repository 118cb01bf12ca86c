// [libs/infra/db-turso/src/repositories/contacts.rs]
/*!
 * =================================================================
 * APARATO: CONTACT REPOSITORY (V12.2 - UPSERT SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE CONTACTOS Y PROYECCIÓN DE SEMILLAS
 *
 * # Mathematical Proof (Last-Write-Wins):
 * El upsert por clave natural (source, permit_number, position) aplica
 * la guardia `excluded.data_as_of >= contacts.data_as_of`: dentro de
 * una corrida las filas se aplican en orden de origen, y entre
 * corridas gana la observación más reciente. El `entity_id` previo
 * se preserva hasta el siguiente rebuild de resolución.
 * =================================================================
 */

use crate::errors::DbError;
use crate::rows;
use crate::TursoClient;
use catastro_domain_models::{Contact, ContactRole, ContactSource};
use catastro_domain_resolution::ContactSeed;
use libsql::params;
use tracing::{info, instrument};

const UPSERT_CONTACT: &str = r#"
    INSERT INTO contacts (
        source, permit_number, position, role, name,
        first_name, last_name, firm_name,
        pts_agent_id, license_number, sf_business_license,
        phone, street_number, street_name, city, state, zip,
        is_applicant, from_date, data_as_of
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
    ON CONFLICT(source, permit_number, position) DO UPDATE SET
        role = excluded.role,
        name = excluded.name,
        first_name = excluded.first_name,
        last_name = excluded.last_name,
        firm_name = excluded.firm_name,
        pts_agent_id = excluded.pts_agent_id,
        license_number = excluded.license_number,
        sf_business_license = excluded.sf_business_license,
        phone = excluded.phone,
        street_number = excluded.street_number,
        street_name = excluded.street_name,
        city = excluded.city,
        state = excluded.state,
        zip = excluded.zip,
        is_applicant = excluded.is_applicant,
        from_date = excluded.from_date,
        data_as_of = excluded.data_as_of
    WHERE excluded.data_as_of IS NULL
       OR contacts.data_as_of IS NULL
       OR excluded.data_as_of >= contacts.data_as_of
"#;

const LOAD_RESOLUTION_SEEDS: &str = r#"
    SELECT id, source, permit_number, role, name, firm_name,
           pts_agent_id, license_number, sf_business_license, from_date
    FROM contacts
    ORDER BY id ASC
"#;

pub struct ContactRepository {
    database_client: TursoClient,
}

impl ContactRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Upsertea una ráfaga de contactos dentro de una transacción única.
    #[instrument(skip(self, contacts))]
    pub async fn batch_upsert_contacts(&self, contacts: &[Contact]) -> Result<usize, DbError> {
        if contacts.is_empty() {
            return Ok(0);
        }

        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        for contact in contacts {
            transaction
                .execute(
                    UPSERT_CONTACT,
                    params![
                        contact.source.as_str(),
                        contact.permit_number.clone(),
                        contact.position,
                        contact.role.as_str(),
                        contact.name.clone(),
                        contact.first_name.clone(),
                        contact.last_name.clone(),
                        contact.firm_name.clone(),
                        contact.pts_agent_id.clone(),
                        contact.license_number.clone(),
                        contact.sf_business_license.clone(),
                        contact.phone.clone(),
                        contact.street_number.clone(),
                        contact.street_name.clone(),
                        contact.city.clone(),
                        contact.state.clone(),
                        contact.zip.clone(),
                        contact.is_applicant as i64,
                        rows::date_to_sql(contact.from_date),
                        rows::timestamp_to_sql(contact.data_as_of)
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        info!("💾 [CONTACT_REPO]: Batch upserted {} contact rows.", contacts.len());
        Ok(contacts.len())
    }

    /// Proyecta la tabla completa a semillas de resolución, en orden de
    /// id ascendente (determinismo de la cascada).
    #[instrument(skip(self))]
    pub async fn load_resolution_seeds(&self) -> Result<Vec<ContactSeed>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection.query(LOAD_RESOLUTION_SEEDS, ()).await?;

        let mut seeds = Vec::new();
        while let Some(row) = result_rows.next().await? {
            let source_label = rows::required_text(&row, 1)?;
            let source = ContactSource::parse(&source_label).ok_or_else(|| {
                DbError::MappingError(format!("unknown contact source '{}'", source_label))
            })?;

            seeds.push(ContactSeed {
                id: rows::required_integer(&row, 0)?,
                source,
                permit_number: rows::required_text(&row, 2)?,
                role: ContactRole::parse(&rows::required_text(&row, 3)?),
                name: rows::optional_text(&row, 4)?.unwrap_or_default(),
                firm_name: rows::optional_text(&row, 5)?,
                pts_agent_id: rows::optional_text(&row, 6)?,
                license_number: rows::optional_text(&row, 7)?,
                sf_business_license: rows::optional_text(&row, 8)?,
                from_date: rows::optional_date(&row, 9)?,
            });
        }

        Ok(seeds)
    }

    pub async fn count_contacts(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query("SELECT COUNT(*) FROM contacts", ())
            .await?;

        match result_rows.next().await? {
            Some(row) => rows::required_integer(&row, 0),
            None => Ok(0),
        }
    }

    /// Conteo de contactos con entity_id poblado (invariante de cobertura).
    pub async fn count_assigned_contacts(&self) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut result_rows = connection
            .query("SELECT COUNT(*) FROM contacts WHERE entity_id IS NOT NULL", ())
            .await?;

        match result_rows.next().await? {
            Some(row) => rows::required_integer(&row, 0),
            None => Ok(0),
        }
    }
}
