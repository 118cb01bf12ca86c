// [libs/domain/models/src/tests_serialization.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PARIDAD DE MODELOS (V3.0 - TRIADA)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MODELS
 * RESPONSABILIDAD: AUDITORÍA DE CONTRATOS SERDE Y ETIQUETAS NOMINALES
 *
 * # Mathematical Proof (Contract Parity):
 * Los discriminadores persistidos en el Ledger (as_str) y los emitidos
 * por serde deben ser bit-idénticos; cualquier deriva rompería la
 * paridad entre el almacén analítico y el Dashboard.
 * =================================================================
 */

use catastro_domain_models::{
    BaselinePeriod, Contact, ContactRole, ContactSource, CycleType, HealthTier,
    ResolutionConfidence, ResolutionMethod, StepStatus,
};
