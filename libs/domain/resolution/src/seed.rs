// [libs/domain/resolution/src/seed.rs]
/*!
 * =================================================================
 * APARATO: RESOLUTION SEED PROJECTION (V5.0 - MINIMAL FOOTPRINT)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: PROYECCIÓN MÍNIMA DE CONTACTOS PARA LA CASCADA
 *
 * La cascada opera sobre ~1.8M de filas en RAM; esta proyección
 * acarrea solo los campos que participan en la resolución para
 * contener la huella de memoria del rebuild completo.
 * =================================================================
 */

use catastro_domain_models::{Contact, ContactRole, ContactSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Proyección de una fila de contacto con lo estrictamente necesario
/// para los cinco pasos de la cascada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSeed {
    pub id: i64,
    pub source: ContactSource,
    pub permit_number: String,
    pub role: ContactRole,
    /// Nombre ya normalizado por la ingesta.
    pub name: String,
    pub firm_name: Option<String>,
    pub pts_agent_id: Option<String>,
    pub license_number: Option<String>,
    pub sf_business_license: Option<String>,
    pub from_date: Option<NaiveDate>,
}

impl From<&Contact> for ContactSeed {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            source: contact.source,
            permit_number: contact.permit_number.clone(),
            role: contact.role,
            name: contact.name.clone(),
            firm_name: contact.firm_name.clone(),
            pts_agent_id: contact.pts_agent_id.clone(),
            license_number: contact.license_number.clone(),
            sf_business_license: contact.sf_business_license.clone(),
            from_date: contact.from_date,
        }
    }
}
