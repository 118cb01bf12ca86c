// [tests/mirror/libs/domain/ingest/transform_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE TRANSFORMACIONES (V2.1 - TRIPLE SOURCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE ALIASING, ROLES Y COERCIONES
 * =================================================================
 */

use catastro_domain_ingest::records::{
    RawAddendaRouting, RawBuildingContact, RawElectricalContact, RawPermit, RawPlumbingContact,
};
use catastro_domain_ingest::{
    map_role, transform_addenda_routing, transform_building_contact,
    transform_electrical_contact, transform_permit, transform_plumbing_contact, ValidationError,
};
use catastro_domain_models::{ContactRole, ContactSource};

#[cfg(test)]
mod tests {
    use super::*;

    /// Forma persona: name = first + last, normalizado.
    #[test]
    fn certify_building_person_shape() {
        let raw_record = RawBuildingContact {
            permit_number: Some("202304015555".into()),
            contact_type: Some("Project Contact".into()),
            first_name: Some("Maria".into()),
            last_name: Some("O'Connor".into()),
            pts_agent_id: Some("P-77".into()),
            ..RawBuildingContact::default()
        };

        let contact = transform_building_contact(&raw_record, 0).expect("row must transform");

        assert_eq!(contact.source, ContactSource::Building);
        assert_eq!(contact.role, ContactRole::ProjectContact);
        assert_eq!(contact.name, "MARIA O CONNOR");
        assert_eq!(contact.pts_agent_id.as_deref(), Some("P-77"));
    }

    /// Forma empresa: company_name proyecta a name Y firm_name;
    /// alias license1 -> license_number.
    #[test]
    fn certify_electrical_business_aliasing() {
        let raw_record = RawElectricalContact {
            permit_number: Some("E202300042".into()),
            contact_type: Some("contractor".into()),
            company_name: Some("Bay Area Electric, LLC".into()),
            license1: Some("C10-4451".into()),
            ..RawElectricalContact::default()
        };

        let contact = transform_electrical_contact(&raw_record, 0).expect("row must transform");

        assert_eq!(contact.name, "BAY AREA ELECTRIC LLC");
        assert_eq!(contact.firm_name.as_deref(), Some("BAY AREA ELECTRIC LLC"));
        assert_eq!(contact.license_number.as_deref(), Some("C10-4451"));
        assert_eq!(contact.pts_agent_id, None, "El dataset eléctrico no acarrea agente PTS.");
    }

    /// Plomería: rol contratista implícito (el dataset no trae rol).
    #[test]
    fn certify_plumbing_implicit_contractor() {
        let raw_record = RawPlumbingContact {
            permit_number: Some("PP20230099".into()),
            firm_name: Some("Mission Plumbing Co.".into()),
            license1: Some("C36-9001".into()),
            ..RawPlumbingContact::default()
        };

        let contact = transform_plumbing_contact(&raw_record, 0).expect("row must transform");
        assert_eq!(contact.role, ContactRole::Contractor);
        assert_eq!(contact.name, "MISSION PLUMBING CO");
    }

    /// El catálogo de roles es cerrado: desconocidos -> other.
    #[test]
    fn certify_role_table_closure() {
        assert_eq!(
            map_role(ContactSource::Building, Some("EXPEDITOR")),
            ContactRole::Expediter
        );
        assert_eq!(
            map_role(ContactSource::Building, Some("notary")),
            ContactRole::Other
        );
        assert_eq!(
            map_role(ContactSource::Electrical, Some("subcontractor")),
            ContactRole::Subcontractor
        );
        assert_eq!(map_role(ContactSource::Plumbing, None), ContactRole::Contractor);
    }

    /// La clave natural faltante rechaza la fila (contenida, no fatal).
    #[test]
    fn certify_missing_natural_key_rejection() {
        let raw_record = RawBuildingContact::default();
        let rejection = transform_building_contact(&raw_record, 0).unwrap_err();
        assert!(matches!(
            rejection,
            ValidationError::MissingField {
                dataset: "building_contacts",
                field: "permit_number"
            }
        ));
    }

    /// Coerción de costo: corrupto -> None, jamás falla la fila.
    #[test]
    fn certify_cost_coercion_containment() {
        let raw_record = RawPermit {
            permit_number: Some("202304016666".into()),
            status: Some("ISSUED".into()),
            estimated_cost: Some("not disclosed".into()),
            ..RawPermit::default()
        };

        let permit = transform_permit(&raw_record).expect("row must transform");
        assert_eq!(permit.estimated_cost, None);
        // El status se canonicaliza a minúsculas para el detector.
        assert_eq!(permit.status.as_deref(), Some("issued"));
    }

    /// addenda_number corrupto es un ValidationError de escalar.
    #[test]
    fn certify_addenda_number_scalar_rejection() {
        let raw_record = RawAddendaRouting {
            application_number: Some("202304015555".into()),
            addenda_number: Some("three".into()),
            ..RawAddendaRouting::default()
        };

        let rejection = transform_addenda_routing(&raw_record).unwrap_err();
        assert!(matches!(
            rejection,
            ValidationError::MalformedScalar {
                dataset: "addenda_routing",
                field: "addenda_number",
                ..
            }
        ));

        // Ausente colapsa en ciclo inicial (0).
        let bare_record = RawAddendaRouting {
            application_number: Some("202304015555".into()),
            ..RawAddendaRouting::default()
        };
        let routing = transform_addenda_routing(&bare_record).expect("row must transform");
        assert_eq!(routing.addenda_number, 0);
    }
}
