// [libs/domain/models/src/signals.rs]
/*!
 * =================================================================
 * APARATO: HEALTH SIGNAL MODELS (V12.0 - COMPOUND RISK)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE SEÑALES POR PERMISO Y POR PROPIEDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EVIDENCE ATTACHED: Cada señal booleana viaja con su evidencia
 *    textual para el render directo en el Dashboard.
 * 2. IMPOSSIBLE PAIR SEALED: El patrón compuesto hold+expired queda
 *    excluido por construcción (los holds solo aplican a permisos
 *    activos).
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Tipos de señal de riesgo reconocidos por el clasificador compuesto.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    HoldComments,
    HoldStalled,
    ExpiredUninspected,
    StaleWithActivity,
    NovOpen,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::HoldComments => "hold_comments",
            SignalKind::HoldStalled => "hold_stalled",
            SignalKind::ExpiredUninspected => "expired_uninspected",
            SignalKind::StaleWithActivity => "stale_with_activity",
            SignalKind::NovOpen => "nov_open",
        }
    }

    /// Bucket de riesgo para el conteo compuesto: ambos holds cuentan
    /// como un único tipo AT_RISK.
    pub fn risk_bucket(&self) -> &'static str {
        match self {
            SignalKind::HoldComments | SignalKind::HoldStalled => "hold",
            SignalKind::ExpiredUninspected => "expired_uninspected",
            SignalKind::StaleWithActivity => "stale_with_activity",
            SignalKind::NovOpen => "nov",
        }
    }
}

/// Evidencia textual adjunta a una señal detectada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvidence {
    pub kind: SignalKind,
    pub detail: String,
}

/// Señales de salud detectadas sobre un permiso individual.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PermitSignals {
    pub permit_number: String,
    pub hold_comments: bool,
    pub hold_stalled: bool,
    pub expired_uninspected: bool,
    pub stale_with_activity: bool,
    pub evidence: Vec<SignalEvidence>,
}

impl PermitSignals {
    pub fn active_kinds(&self) -> Vec<SignalKind> {
        let mut kinds = Vec::new();
        if self.hold_comments {
            kinds.push(SignalKind::HoldComments);
        }
        if self.hold_stalled {
            kinds.push(SignalKind::HoldStalled);
        }
        if self.expired_uninspected {
            kinds.push(SignalKind::ExpiredUninspected);
        }
        if self.stale_with_activity {
            kinds.push(SignalKind::StaleWithActivity);
        }
        kinds
    }
}

/// Nivel de salud compuesto de una propiedad (block/lot).
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthTier {
    HighRisk,
    AtRisk,
    Behind,
    OnTrack,
    Quiet,
}

impl HealthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthTier::HighRisk => "HIGH_RISK",
            HealthTier::AtRisk => "AT_RISK",
            HealthTier::Behind => "BEHIND",
            HealthTier::OnTrack => "ON_TRACK",
            HealthTier::Quiet => "QUIET",
        }
    }

    pub fn parse(raw_label: &str) -> Option<Self> {
        match raw_label {
            "HIGH_RISK" => Some(HealthTier::HighRisk),
            "AT_RISK" => Some(HealthTier::AtRisk),
            "BEHIND" => Some(HealthTier::Behind),
            "ON_TRACK" => Some(HealthTier::OnTrack),
            "QUIET" => Some(HealthTier::Quiet),
            _ => None,
        }
    }
}

/// Agregado de señales por propiedad: permisos + violaciones abiertas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySignals {
    pub block: Option<String>,
    pub lot: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub permit_count: i64,
    pub open_violation_count: i64,
    /// Tipos de señal distintos observados en la propiedad.
    pub signal_kinds: Vec<SignalKind>,
    /// Buckets de riesgo distintos que componen el patrón.
    pub compound_pattern: Vec<String>,
    pub health: HealthTier,
}
