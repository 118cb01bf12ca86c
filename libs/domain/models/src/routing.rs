// [libs/domain/models/src/routing.rs]
/*!
 * =================================================================
 * APARATO: ADDENDA ROUTING MODELS (V12.0 - STATION SUBSTRATE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE EVENTOS DE RUTEO POR ESTACIÓN
 * =================================================================
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ciclo de revisión al que pertenece un evento de ruteo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CycleType {
    /// `addenda_number = 0`: primer pase de revisión del plano.
    Initial,
    /// `addenda_number >= 1`: ciclos de revisión tras cambios.
    Revision,
}

impl CycleType {
    pub fn from_addenda_number(addenda_number: i64) -> Self {
        if addenda_number == 0 {
            CycleType::Initial
        } else {
            CycleType::Revision
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::Initial => "initial",
            CycleType::Revision => "revision",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "initial" => Some(CycleType::Initial),
            "revision" => Some(CycleType::Revision),
            _ => None,
        }
    }
}

/// Un evento (permiso, estación, ciclo) del workflow de revisión de planos.
/// Sustrato de los baselines de velocidad y del diagnóstico de atascos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddendaRouting {
    pub id: i64,
    pub permit_number: String,
    pub station: Option<String>,
    pub addenda_number: i64,
    pub arrive_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub review_result: Option<String>,
    pub hold_description: Option<String>,
    pub reviewer: Option<String>,
    pub data_as_of: Option<DateTime<Utc>>,
}

impl AddendaRouting {
    /// Duración observada de la revisión en días. None si falta alguna fecha.
    pub fn duration_days(&self) -> Option<i64> {
        match (self.arrive_date, self.finish_date) {
            (Some(arrive), Some(finish)) => Some((finish - arrive).num_days()),
            _ => None,
        }
    }

    pub fn cycle_type(&self) -> CycleType {
        CycleType::from_addenda_number(self.addenda_number)
    }

    /// Una estación sin fecha de cierre sigue reteniendo el plano.
    pub fn is_open(&self) -> bool {
        self.finish_date.is_none()
    }
}
