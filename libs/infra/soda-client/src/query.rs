// [libs/infra/soda-client/src/query.rs]
/*!
 * =================================================================
 * APARATO: SODA QUERY COMPOSER (V4.0 - DELTA CURSOR)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: COMPOSICIÓN DE $where/$order CON FILTRO DELTA
 * =================================================================
 */

use chrono::{DateTime, Utc};

/// Parámetros de consulta de un fetch paginado contra el portal.
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    pub where_clause: Option<String>,
    pub order: Option<String>,
    /// Cursor delta: solo registros con `data_as_of` posterior.
    pub since: Option<DateTime<Utc>>,
}

impl FetchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Pliega el cursor delta dentro del $where efectivo del portal.
    pub fn effective_where(&self, delta_field: &str) -> Option<String> {
        let since_clause = self.since.map(|cursor| {
            format!(
                "{} >= '{}'",
                delta_field,
                cursor.format("%Y-%m-%dT%H:%M:%S")
            )
        });

        match (&self.where_clause, since_clause) {
            (Some(explicit), Some(delta)) => Some(format!("({}) AND {}", explicit, delta)),
            (Some(explicit), None) => Some(explicit.clone()),
            (None, Some(delta)) => Some(delta),
            (None, None) => None,
        }
    }
}
