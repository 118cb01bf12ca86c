// [libs/domain/models/src/velocity.rs]
/*!
 * =================================================================
 * APARATO: VELOCITY BASELINE MODELS (V12.0 - PERCENTILE STRATA)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE BASELINES ROLADOS POR ESTACIÓN
 * =================================================================
 */

use crate::routing::CycleType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Ventana rolada sobre la que se computa un baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePeriod {
    /// Ventana de 90 días (auto-ensanchada a 180 ante muestra corta).
    Current,
    /// Ventana de 365 días.
    Baseline,
}

impl BaselinePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselinePeriod::Current => "current",
            BaselinePeriod::Baseline => "baseline",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "current" => Some(BaselinePeriod::Current),
            "baseline" => Some(BaselinePeriod::Baseline),
            _ => None,
        }
    }
}

/// Fila derivada por (estación, vecindario?, periodo, tipo de ciclo).
///
/// Invariante: percentiles monótonos no decrecientes. Las filas con
/// muestra corta viajan con `low_confidence = true` y quedan fuera de
/// las consultas por defecto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityBaseline {
    pub station: String,
    pub neighborhood: Option<String>,
    pub period: BaselinePeriod,
    pub cycle_type: CycleType,
    /// Días reales de la ventana utilizada (90, 180 o 365).
    pub window_days: i64,
    pub sample_count: i64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub low_confidence: bool,
    pub computed_at: DateTime<Utc>,
}

/// Veredicto de tendencia: p50 actual contra p50 del baseline anual.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendVerdict {
    /// p50 actual > +15% sobre el baseline.
    Slower,
    /// p50 actual < -15% bajo el baseline.
    Faster,
    Normal,
}

impl TrendVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendVerdict::Slower => "slower",
            TrendVerdict::Faster => "faster",
            TrendVerdict::Normal => "normal",
        }
    }
}
