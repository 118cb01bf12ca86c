// [libs/domain/velocity/src/percentile.rs]
/*!
 * =================================================================
 * APARATO: PERCENTILE SUMMARIZER (V6.0 - LINEAR INTERPOLATION)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: RESUMEN P25/P50/P75/P90 SOBRE DURACIONES ORDENADAS
 *
 * # Mathematical Proof (Percentile Monotonicity):
 * Sobre un vector ordenado, la interpolación lineal en rangos
 * crecientes de q produce valores no decrecientes; el invariante
 * p25 <= p50 <= p75 <= p90 se cumple para toda muestra no vacía.
 * =================================================================
 */

/// Resumen de percentiles de una distribución de duraciones en días.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileSummary {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl PercentileSummary {
    /// Construye el resumen desde un slice YA ordenado ascendente.
    /// Slice vacío rinde el resumen nulo (todas las marcas en 0).
    pub fn from_sorted(sorted_durations: &[f64]) -> Self {
        Self {
            p25: linear_percentile(sorted_durations, 0.25),
            p50: linear_percentile(sorted_durations, 0.50),
            p75: linear_percentile(sorted_durations, 0.75),
            p90: linear_percentile(sorted_durations, 0.90),
        }
    }
}

/// Percentil por interpolación lineal sobre un slice ordenado.
pub fn linear_percentile(sorted_values: &[f64], quantile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped_quantile = quantile.clamp(0.0, 1.0);
    let continuous_rank = clamped_quantile * (sorted_values.len() - 1) as f64;
    let lower_index = continuous_rank.floor() as usize;
    let upper_index = continuous_rank.ceil() as usize;

    if lower_index == upper_index {
        return sorted_values[lower_index];
    }

    let fraction = continuous_rank - lower_index as f64;
    sorted_values[lower_index] + fraction * (sorted_values[upper_index] - sorted_values[lower_index])
}
