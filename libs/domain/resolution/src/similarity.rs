// [libs/domain/resolution/src/similarity.rs]
/*!
 * =================================================================
 * APARATO: TOKEN-SET SIMILARITY ENGINE (V5.0 - ORDER BLIND)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: BLOQUEO DETERMINISTA Y JACCARD SOBRE TOKENS
 *
 * # Mathematical Proof (Blocking Feasibility):
 * Todos-contra-todos sobre 1.8M de filas (~3.24e12 pares) es
 * inviable. El bloqueo por prefijo de 3 caracteres del token
 * significativo menor reduce la comparación a pares intra-bloque.
 * La clave se deriva del token lexicográficamente menor (no del
 * primer token del texto) para que las permutaciones de orden de un
 * mismo nombre caigan en el mismo bloque.
 * =================================================================
 */

use std::collections::BTreeSet;

/// Umbral de similitud Jaccard para unirse a un cluster existente.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.75;

/// Sufijos societarios que no aportan identidad discriminante. Se
/// excluyen del set de tokens cuando queda al menos un token
/// significativo; "ACME INC" y "ACME" refieren al mismo actor.
const CORPORATE_SUFFIX_STOPWORDS: &[&str] = &[
    "INC", "LLC", "CORP", "CO", "LTD", "LP", "COMPANY", "INCORPORATED", "CORPORATION",
];

fn is_corporate_suffix(token: &str) -> bool {
    CORPORATE_SUFFIX_STOPWORDS.contains(&token)
}

/// Set de tokens significativos de un nombre normalizado.
/// Fallback: si el filtro societario vacía el set, se conservan todos
/// los tokens originales para no perder la identidad residual.
pub fn significant_tokens(normalized_name: &str) -> BTreeSet<String> {
    let all_tokens: BTreeSet<String> = normalized_name
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let significant: BTreeSet<String> = all_tokens
        .iter()
        .filter(|token| !is_corporate_suffix(token))
        .cloned()
        .collect();

    if significant.is_empty() {
        all_tokens
    } else {
        significant
    }
}

/// Jaccard token-set: |A ∩ B| / |A ∪ B|. Sets vacíos -> 0.0.
pub fn token_set_jaccard(tokens_a: &BTreeSet<String>, tokens_b: &BTreeSet<String>) -> f64 {
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection_size = tokens_a.intersection(tokens_b).count();
    let union_size = tokens_a.len() + tokens_b.len() - intersection_size;

    if union_size == 0 {
        0.0
    } else {
        intersection_size as f64 / union_size as f64
    }
}

/// Clave de bloqueo: primeros 3 caracteres del token significativo
/// lexicográficamente menor. None ante set vacío (nombre vacío).
pub fn block_key(tokens: &BTreeSet<String>) -> Option<String> {
    tokens
        .iter()
        .next()
        .map(|smallest_token| smallest_token.chars().take(3).collect())
}
