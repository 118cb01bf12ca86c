// [libs/domain/ingest/src/transform.rs]
/*!
 * =================================================================
 * APARATO: UNIFIED SCHEMA TRANSFORMER (V3.1 - TRIPLE SOURCE)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: MAPEO CANÓNICO DE REGISTROS CRUDOS AL ALMACÉN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FIELD ALIASING: `license1` -> `license_number`; fuentes con forma
 *    empresa proyectan company/firm a `name` Y `firm_name`; fuentes
 *    con forma persona componen `name` desde first+last.
 * 2. ROW CONTAINMENT: Toda coerción fallida de escalar opcional rinde
 *    None; solo la ausencia de clave natural rechaza la fila.
 * 3. SYNTHETIC ID DEFERRED: El `id` viaja en 0; el Ledger lo asigna
 *    en el upsert.
 * =================================================================
 */

use crate::errors::ValidationError;
use crate::normalize::{normalize_name, parse_cost, parse_date, parse_timestamp};
use crate::records::{
    RawAddendaRouting, RawBuildingContact, RawElectricalContact, RawInspection, RawPermit,
    RawPlumbingContact, RawViolation,
};
use crate::roles::map_role;
use catastro_domain_models::{AddendaRouting, Contact, ContactSource, Inspection, Permit, Violation};

fn require_field<'a>(
    value: Option<&'a str>,
    dataset: &'static str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(ValidationError::MissingField { dataset, field }),
    }
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

fn parse_applicant_flag(raw_flag: &Option<String>) -> bool {
    matches!(
        raw_flag.as_deref().map(str::trim),
        Some("Y") | Some("y") | Some("true") | Some("TRUE")
    )
}

/// Transforma un contacto de building al esquema unificado.
/// Forma persona: `name = first_name + " " + last_name`, normalizado.
pub fn transform_building_contact(
    raw_record: &RawBuildingContact,
    position: i64,
) -> Result<Contact, ValidationError> {
    let permit_number = require_field(
        raw_record.permit_number.as_deref(),
        "building_contacts",
        "permit_number",
    )?;

    let composed_name = match (
        clean_optional(&raw_record.first_name),
        clean_optional(&raw_record.last_name),
    ) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first,
        (None, Some(last)) => last,
        // Algunos registros de building solo traen la firma.
        (None, None) => clean_optional(&raw_record.firm_name).unwrap_or_default(),
    };

    Ok(Contact {
        id: 0,
        source: ContactSource::Building,
        permit_number: permit_number.to_string(),
        position,
        role: map_role(ContactSource::Building, raw_record.contact_type.as_deref()),
        name: normalize_name(&composed_name),
        first_name: clean_optional(&raw_record.first_name).map(|value| normalize_name(&value)),
        last_name: clean_optional(&raw_record.last_name).map(|value| normalize_name(&value)),
        firm_name: clean_optional(&raw_record.firm_name).map(|value| normalize_name(&value)),
        pts_agent_id: clean_optional(&raw_record.pts_agent_id),
        license_number: clean_optional(&raw_record.license_number),
        sf_business_license: clean_optional(&raw_record.sf_business_license),
        phone: clean_optional(&raw_record.phone),
        street_number: clean_optional(&raw_record.street_number),
        street_name: clean_optional(&raw_record.street_name),
        city: clean_optional(&raw_record.city),
        state: clean_optional(&raw_record.state),
        zip: clean_optional(&raw_record.zip),
        is_applicant: parse_applicant_flag(&raw_record.is_applicant),
        from_date: parse_date(raw_record.from_date.as_deref()),
        entity_id: None,
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma un contacto eléctrico (forma empresa): `company_name`
/// proyecta simultáneamente a `name` y `firm_name`.
pub fn transform_electrical_contact(
    raw_record: &RawElectricalContact,
    position: i64,
) -> Result<Contact, ValidationError> {
    let permit_number = require_field(
        raw_record.permit_number.as_deref(),
        "electrical_contacts",
        "permit_number",
    )?;

    let normalized_company = clean_optional(&raw_record.company_name)
        .map(|value| normalize_name(&value))
        .unwrap_or_default();

    Ok(Contact {
        id: 0,
        source: ContactSource::Electrical,
        permit_number: permit_number.to_string(),
        position,
        role: map_role(ContactSource::Electrical, raw_record.contact_type.as_deref()),
        name: normalized_company.clone(),
        first_name: None,
        last_name: None,
        firm_name: if normalized_company.is_empty() {
            None
        } else {
            Some(normalized_company)
        },
        pts_agent_id: None,
        license_number: clean_optional(&raw_record.license1),
        sf_business_license: clean_optional(&raw_record.sf_business_license),
        phone: clean_optional(&raw_record.phone),
        street_number: clean_optional(&raw_record.street_number),
        street_name: clean_optional(&raw_record.street_name),
        city: clean_optional(&raw_record.city),
        state: clean_optional(&raw_record.state),
        zip: clean_optional(&raw_record.zip),
        is_applicant: parse_applicant_flag(&raw_record.is_applicant),
        from_date: parse_date(raw_record.from_date.as_deref()),
        entity_id: None,
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma un contacto de plomería: rol contratista implícito y
/// proyección empresa a `name` + `firm_name`.
pub fn transform_plumbing_contact(
    raw_record: &RawPlumbingContact,
    position: i64,
) -> Result<Contact, ValidationError> {
    let permit_number = require_field(
        raw_record.permit_number.as_deref(),
        "plumbing_contacts",
        "permit_number",
    )?;

    let normalized_firm = clean_optional(&raw_record.firm_name)
        .map(|value| normalize_name(&value))
        .unwrap_or_default();

    Ok(Contact {
        id: 0,
        source: ContactSource::Plumbing,
        permit_number: permit_number.to_string(),
        position,
        role: map_role(ContactSource::Plumbing, None),
        name: normalized_firm.clone(),
        first_name: None,
        last_name: None,
        firm_name: if normalized_firm.is_empty() {
            None
        } else {
            Some(normalized_firm)
        },
        pts_agent_id: None,
        license_number: clean_optional(&raw_record.license1),
        sf_business_license: clean_optional(&raw_record.sf_business_license),
        phone: clean_optional(&raw_record.phone),
        street_number: clean_optional(&raw_record.street_number),
        street_name: clean_optional(&raw_record.street_name),
        city: clean_optional(&raw_record.city),
        state: clean_optional(&raw_record.state),
        zip: clean_optional(&raw_record.zip),
        is_applicant: parse_applicant_flag(&raw_record.is_applicant),
        from_date: parse_date(raw_record.from_date.as_deref()),
        entity_id: None,
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma el registro maestro de un permiso.
pub fn transform_permit(raw_record: &RawPermit) -> Result<Permit, ValidationError> {
    let permit_number = require_field(
        raw_record.permit_number.as_deref(),
        "building_permits",
        "permit_number",
    )?;

    Ok(Permit {
        permit_number: permit_number.to_string(),
        permit_type: clean_optional(&raw_record.permit_type_definition),
        status: clean_optional(&raw_record.status).map(|value| value.to_ascii_lowercase()),
        status_date: parse_date(raw_record.status_date.as_deref()),
        filed_date: parse_date(raw_record.filed_date.as_deref()),
        issued_date: parse_date(raw_record.issued_date.as_deref()),
        approved_date: parse_date(raw_record.approved_date.as_deref()),
        completed_date: parse_date(raw_record.completed_date.as_deref()),
        estimated_cost: parse_cost(raw_record.estimated_cost.as_deref()),
        street_number: clean_optional(&raw_record.street_number),
        street_name: clean_optional(&raw_record.street_name),
        neighborhood: clean_optional(&raw_record.neighborhoods_analysis_boundaries),
        block: clean_optional(&raw_record.block),
        lot: clean_optional(&raw_record.lot),
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma un evento de inspección.
pub fn transform_inspection(raw_record: &RawInspection) -> Result<Inspection, ValidationError> {
    let reference_number = require_field(
        raw_record.reference_number.as_deref(),
        "inspections",
        "reference_number",
    )?;

    Ok(Inspection {
        id: 0,
        reference_number: reference_number.to_string(),
        inspection_type: clean_optional(&raw_record.inspection_type),
        inspector: clean_optional(&raw_record.inspector).map(|value| normalize_name(&value)),
        inspection_date: parse_date(raw_record.inspection_date.as_deref()),
        result: clean_optional(&raw_record.result),
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma un evento de ruteo de addenda. `addenda_number` corrupto
/// colapsa en 0 (ciclo inicial) con advertencia contenida a la fila.
pub fn transform_addenda_routing(
    raw_record: &RawAddendaRouting,
) -> Result<AddendaRouting, ValidationError> {
    let permit_number = require_field(
        raw_record.application_number.as_deref(),
        "addenda_routing",
        "application_number",
    )?;

    let addenda_number = match clean_optional(&raw_record.addenda_number) {
        Some(raw_value) => raw_value.parse::<i64>().map_err(|parse_fault| {
            ValidationError::MalformedScalar {
                dataset: "addenda_routing",
                field: "addenda_number",
                detail: parse_fault.to_string(),
            }
        })?,
        None => 0,
    };

    Ok(AddendaRouting {
        id: 0,
        permit_number: permit_number.to_string(),
        station: clean_optional(&raw_record.station),
        addenda_number,
        arrive_date: parse_date(raw_record.arrive_date.as_deref()),
        finish_date: parse_date(raw_record.finish_date.as_deref()),
        review_result: clean_optional(&raw_record.review_results),
        hold_description: clean_optional(&raw_record.hold_description),
        reviewer: clean_optional(&raw_record.assigned_to),
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}

/// Transforma un aviso de violación.
pub fn transform_violation(raw_record: &RawViolation) -> Result<Violation, ValidationError> {
    let complaint_number = require_field(
        raw_record.complaint_number.as_deref(),
        "violations",
        "complaint_number",
    )?;

    Ok(Violation {
        id: 0,
        complaint_number: Some(complaint_number.to_string()),
        status: clean_optional(&raw_record.status),
        nov_category: clean_optional(&raw_record.nov_category_description),
        block: clean_optional(&raw_record.block),
        lot: clean_optional(&raw_record.lot),
        street_number: clean_optional(&raw_record.street_number),
        street_name: clean_optional(&raw_record.street_name),
        date_filed: parse_date(raw_record.date_filed.as_deref()),
        data_as_of: parse_timestamp(raw_record.data_as_of.as_deref()),
    })
}
