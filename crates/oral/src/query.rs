use crate::{dialect::Dialect, value::Value};

/// Conflict-resolution policy for an insert. A dispatch key, not stored
/// data: each variant selects a cached statement slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAction {
    /// Plain INSERT; a constraint violation is an error.
    Default,
    /// Keep the existing row on conflict; reports zero rows affected.
    Ignore,
    /// Overwrite the existing row on conflict.
    Replace,
}

impl InsertAction {
    pub(crate) const COUNT: usize = 3;

    pub(crate) fn index(self) -> usize {
        match self {
            InsertAction::Default => 0,
            InsertAction::Ignore => 1,
            InsertAction::Replace => 2,
        }
    }
}

/// Dialect-owned insert-statement source.
///
/// Implementations compute the shared suffix (column list + VALUES
/// placeholders) once at construction and build the full statement text
/// lazily, one cached slot per [`InsertAction`]. The text is never rebuilt
/// for the lifetime of the builder.
pub trait InsertQueryBuilder {
    fn sql(&self, action: InsertAction) -> &str;
}

/// A row predicate, serialized into a parametrized WHERE clause.
///
/// Values bind positionally in serialization order, after any values the
/// enclosing statement binds first.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    /// Column equality.
    Eq(&'static str, Value),
    /// Conjunction of sub-filters.
    And(Vec<Filter>),
}

impl Filter {
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::All => other,
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Renders `" WHERE …"` (empty for [`Filter::All`]) and collects the
    /// values to bind into `params`.
    pub(crate) fn to_where(&self, dialect: &dyn Dialect, params: &mut Vec<Value>) -> String {
        let clause = self.render(dialect, params);
        if clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {clause}")
        }
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut Vec<Value>) -> String {
        match self {
            Filter::All => String::new(),
            Filter::Eq(column, value) => {
                params.push(value.clone());
                format!("{column} = {}", dialect.placeholder(params.len()))
            }
            Filter::And(filters) => {
                let parts: Vec<String> = filters
                    .iter()
                    .map(|filter| filter.render(dialect, params))
                    .filter(|part| !part.is_empty())
                    .collect();
                parts.join(" AND ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;

    #[test]
    fn all_renders_no_clause() {
        let mut params = vec![];
        assert_eq!(Filter::All.to_where(&SqliteDialect, &mut params), "");
        assert!(params.is_empty());
    }

    #[test]
    fn conjunction_binds_in_order() {
        let filter = Filter::Eq("folder", Value::Integer(3)).and(Filter::Eq("name", "x".into()));
        let mut params = vec![];
        let clause = filter.to_where(&SqliteDialect, &mut params);
        assert_eq!(clause, " WHERE folder = ? AND name = ?");
        assert_eq!(params, vec![Value::Integer(3), Value::Text("x".into())]);
    }
}
