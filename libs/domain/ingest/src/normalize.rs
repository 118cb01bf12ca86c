// [libs/domain/ingest/src/normalize.rs]
/*!
 * =================================================================
 * APARATO: NOMINAL NORMALIZATION ENGINE (V3.0 - IDEMPOTENT)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: COERCIONES ESCALARES Y NORMALIZACIÓN DE NOMBRES
 *
 * # Mathematical Proof (Normalization Idempotence):
 * normalize(normalize(x)) = normalize(x). La salida solo contiene
 * [A-Z0-9] y blancos simples internos; re-aplicar el mapeo sobre ese
 * alfabeto es la identidad.
 * =================================================================
 */

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Normaliza un nombre al formato canónico del almacén: UPPER-case,
/// puntuación erradicada, blancos internos colapsados, extremos podados.
pub fn normalize_name(raw_name: &str) -> String {
    let mut normalized_buffer = String::with_capacity(raw_name.len());
    let mut pending_separator = false;

    for character in raw_name.chars() {
        if character.is_alphanumeric() {
            if pending_separator && !normalized_buffer.is_empty() {
                normalized_buffer.push(' ');
            }
            pending_separator = false;
            // La expansión de mayúsculas puede emitir marcas
            // combinantes; solo sobreviven alfanuméricos.
            for upper_character in character.to_uppercase() {
                if upper_character.is_alphanumeric() {
                    normalized_buffer.push(upper_character);
                }
            }
        } else {
            // Puntuación y blancos colapsan en un único separador diferido.
            pending_separator = true;
        }
    }

    normalized_buffer
}

/// Castea el costo estimado desde el texto del portal. Vacío o corrupto
/// -> None; la fila nunca falla por este campo.
pub fn parse_cost(raw_cost: Option<&str>) -> Option<f64> {
    let trimmed_value = raw_cost?.trim();
    if trimmed_value.is_empty() {
        return None;
    }

    let sanitized_value: String = trimmed_value
        .chars()
        .filter(|character| *character != '$' && *character != ',')
        .collect();

    sanitized_value.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Decodifica una fecha del portal (ISO con o sin componente horario).
pub fn parse_date(raw_date: Option<&str>) -> Option<NaiveDate> {
    let trimmed_value = raw_date?.trim();
    if trimmed_value.is_empty() {
        return None;
    }

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed_value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(timestamp.date());
    }
    NaiveDate::parse_from_str(trimmed_value, "%Y-%m-%d").ok()
}

/// Decodifica el timestamp flotante del portal asumiendo UTC.
pub fn parse_timestamp(raw_timestamp: Option<&str>) -> Option<DateTime<Utc>> {
    let trimmed_value = raw_timestamp?.trim();
    if trimmed_value.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed_value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed_value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
