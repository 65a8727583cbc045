//! Dynamic WHERE-clause builder for list endpoints
//!
//! Conditions are written with `$?` placeholders; `where_clause()`
//! renumbers them into positional `$1..$n` parameters so a fragment can be
//! composed without knowing its final position. Bindings are replayed onto
//! the query in insertion order via the `bind_*` helpers.

use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};

/// One bound value.
#[derive(Debug, Clone)]
pub enum Bind {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// Accumulates SQL conditions and their bound values.
#[derive(Debug, Default)]
pub struct Filter {
    conditions: Vec<String>,
    bindings: Vec<Bind>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw condition with `$?` placeholders and matching bindings.
    pub fn push(&mut self, condition: &str, bindings: Vec<Bind>) {
        self.conditions.push(condition.to_string());
        self.bindings.extend(bindings);
    }

    pub fn eq_i64(&mut self, column: &str, value: Option<i64>) {
        if let Some(v) = value {
            self.push(&format!("{column} = $?"), vec![Bind::Int(v)]);
        }
    }

    pub fn eq_text(&mut self, column: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.push(&format!("{column} = $?"), vec![Bind::Text(v.to_string())]);
        }
    }

    pub fn eq_bool(&mut self, column: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.push(&format!("{column} = $?"), vec![Bind::Bool(v)]);
        }
    }

    /// Case-insensitive substring match.
    pub fn ilike(&mut self, column: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.push(
                &format!("{column} ILIKE $?"),
                vec![Bind::Text(format!("%{v}%"))],
            );
        }
    }

    /// Inclusive range on an i64 column; either bound may be open.
    pub fn range_i64(&mut self, column: &str, min: Option<i64>, max: Option<i64>) {
        if let Some(v) = min {
            self.push(&format!("{column} >= $?"), vec![Bind::Int(v)]);
        }
        if let Some(v) = max {
            self.push(&format!("{column} <= $?"), vec![Bind::Int(v)]);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of bound parameters, useful for numbering LIMIT/OFFSET
    /// parameters that come after the filter's.
    pub fn arg_count(&self) -> usize {
        self.bindings.len()
    }

    /// Render `WHERE c1 AND c2 ...` with placeholders numbered `$1..$n`,
    /// or an empty string when no condition was added.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let joined = self.conditions.join(" AND ");
        let mut out = String::with_capacity(joined.len() + 8);
        out.push_str(" WHERE ");
        let mut n = 0;
        let mut rest = joined.as_str();
        while let Some(pos) = rest.find("$?") {
            n += 1;
            out.push_str(&rest[..pos]);
            out.push('$');
            out.push_str(&n.to_string());
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    pub fn bind_query_as<'q, T>(
        &'q self,
        mut query: QueryAs<'q, Postgres, T, PgArguments>,
    ) -> QueryAs<'q, Postgres, T, PgArguments> {
        for b in &self.bindings {
            query = match b {
                Bind::Text(v) => query.bind(v),
                Bind::Int(v) => query.bind(v),
                Bind::Bool(v) => query.bind(v),
            };
        }
        query
    }

    pub fn bind_query_scalar<'q, T>(
        &'q self,
        mut query: QueryScalar<'q, Postgres, T, PgArguments>,
    ) -> QueryScalar<'q, Postgres, T, PgArguments> {
        for b in &self.bindings {
            query = match b {
                Bind::Text(v) => query.bind(v),
                Bind::Int(v) => query.bind(v),
                Bind::Bool(v) => query.bind(v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_renders_nothing() {
        let f = Filter::new();
        assert_eq!(f.where_clause(), "");
        assert_eq!(f.arg_count(), 0);
    }

    #[test]
    fn placeholders_are_renumbered_in_order() {
        let mut f = Filter::new();
        f.eq_i64("o.pharmacy_id", Some(10));
        f.ilike("p.name", Some("نور"));
        f.range_i64("o.created_at", Some(100), Some(200));

        assert_eq!(
            f.where_clause(),
            " WHERE o.pharmacy_id = $1 AND p.name ILIKE $2 AND o.created_at >= $3 AND o.created_at <= $4"
        );
        assert_eq!(f.arg_count(), 4);
    }

    #[test]
    fn none_values_add_no_conditions() {
        let mut f = Filter::new();
        f.eq_i64("id", None);
        f.eq_text("city", None);
        f.eq_bool("is_active", None);
        f.ilike("name", None);
        f.range_i64("created_at", None, None);
        assert!(f.is_empty());
    }

    #[test]
    fn raw_condition_with_multiple_placeholders() {
        let mut f = Filter::new();
        f.push(
            "EXISTS (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.warehouse_id = $?)",
            vec![Bind::Int(7)],
        );
        f.eq_bool("i.is_active", Some(true));

        let clause = f.where_clause();
        assert!(clause.contains("iw.warehouse_id = $1"));
        assert!(clause.contains("i.is_active = $2"));
    }
}
