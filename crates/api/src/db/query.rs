//! Generic parameterized query construction over `sqlx::QueryBuilder`.
//!
//! The typed repositories sit on top of this module: equality / in-list /
//! range filters, inner and left joins, an optional row limit, dynamic
//! updates restricted to the provided fields, and insert-or-update-on-conflict
//! against a caller-specified unique constraint. Column and table names are
//! compile-time identifiers (`&'static str`); only values are bound.

use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

/// A value bound into a generated statement.
#[derive(Debug, Clone)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A row filter. Filters combine with `AND`.
#[derive(Debug, Clone)]
pub enum Filter {
    /// `column = value`
    Eq(&'static str, SqlValue),
    /// `column IN (values...)`
    In(&'static str, Vec<SqlValue>),
    /// `column > value`
    Gt(&'static str, SqlValue),
    /// `column < value`
    Lt(&'static str, SqlValue),
    /// `column >= value`
    Gte(&'static str, SqlValue),
    /// `column <= value`
    Lte(&'static str, SqlValue),
}

/// Join type for [`Join`].
#[derive(Debug, Clone, Copy)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A join specification: `<kind> JOIN table ON left = right`.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

/// Errors from statement construction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A dynamic update was requested with no fields to set.
    #[error("no fields left to update")]
    EmptyUpdate,
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Text(v) => {
            builder.push_bind(v);
        }
        SqlValue::Int(v) => {
            builder.push_bind(v);
        }
        SqlValue::Decimal(v) => {
            builder.push_bind(v);
        }
        SqlValue::Bool(v) => {
            builder.push_bind(v);
        }
        SqlValue::Null => {
            builder.push_bind(None::<String>);
        }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: Vec<Filter>) {
    for (i, filter) in filters.into_iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq(column, value) => {
                builder.push(column).push(" = ");
                push_value(builder, value);
            }
            Filter::In(column, values) => {
                builder.push(column).push(" IN (");
                for (j, value) in values.into_iter().enumerate() {
                    if j > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value);
                }
                builder.push(")");
            }
            Filter::Gt(column, value) => {
                builder.push(column).push(" > ");
                push_value(builder, value);
            }
            Filter::Lt(column, value) => {
                builder.push(column).push(" < ");
                push_value(builder, value);
            }
            Filter::Gte(column, value) => {
                builder.push(column).push(" >= ");
                push_value(builder, value);
            }
            Filter::Lte(column, value) => {
                builder.push(column).push(" <= ");
                push_value(builder, value);
            }
        }
    }
}

/// Build a `SELECT` statement.
#[must_use]
pub fn select(
    table: &'static str,
    columns: &[&str],
    filters: Vec<Filter>,
    joins: &[Join],
    limit: Option<i64>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(columns.join(", "));
    builder.push(" FROM ").push(table);

    for join in joins {
        match join.kind {
            JoinKind::Inner => builder.push(" JOIN "),
            JoinKind::Left => builder.push(" LEFT JOIN "),
        };
        builder
            .push(join.table)
            .push(" ON ")
            .push(join.left)
            .push(" = ")
            .push(join.right);
    }

    push_filters(&mut builder, filters);

    if let Some(limit) = limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    builder
}

/// Build an `INSERT ... RETURNING *` statement for a single row.
#[must_use]
pub fn insert(
    table: &'static str,
    columns: &[&str],
    values: Vec<SqlValue>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder
        .push(table)
        .push(" (")
        .push(columns.join(", "))
        .push(") VALUES (");
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(") RETURNING *");
    builder
}

/// Build an `UPDATE ... SET ... RETURNING *` statement from the provided
/// column/value pairs.
///
/// # Errors
///
/// Returns [`BuildError::EmptyUpdate`] if `set` is empty.
pub fn update(
    table: &'static str,
    set: Vec<(&'static str, SqlValue)>,
    filters: Vec<Filter>,
) -> Result<QueryBuilder<'static, Postgres>, BuildError> {
    if set.is_empty() {
        return Err(BuildError::EmptyUpdate);
    }

    let mut builder = QueryBuilder::new("UPDATE ");
    builder.push(table).push(" SET ");
    for (i, (column, value)) in set.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column).push(" = ");
        push_value(&mut builder, value);
    }

    push_filters(&mut builder, filters);
    builder.push(" RETURNING *");
    Ok(builder)
}

/// Build a `DELETE` statement. No core flow deletes rows today.
#[allow(dead_code)]
#[must_use]
pub fn delete(table: &'static str, filters: Vec<Filter>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("DELETE FROM ");
    builder.push(table);
    push_filters(&mut builder, filters);
    builder
}

/// Build an insert-or-update-on-conflict statement.
///
/// Without a conflict target this is a plain insert. With one, conflicting
/// rows are updated from `EXCLUDED` for every column not listed in
/// `exclude_from_update`.
///
/// # Errors
///
/// Returns [`BuildError::EmptyUpdate`] if excluding leaves no column to
/// update.
#[allow(dead_code)]
pub fn upsert(
    table: &'static str,
    columns: &[&'static str],
    values: Vec<SqlValue>,
    conflict_target: Option<&str>,
    exclude_from_update: &[&str],
) -> Result<QueryBuilder<'static, Postgres>, BuildError> {
    let assignments: Vec<String> = columns
        .iter()
        .copied()
        .filter(|column| !exclude_from_update.contains(column))
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();
    if conflict_target.is_some() && assignments.is_empty() {
        return Err(BuildError::EmptyUpdate);
    }

    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder
        .push(table)
        .push(" (")
        .push(columns.join(", "))
        .push(") VALUES (");
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(")");

    if let Some(target) = conflict_target {
        builder
            .push(" ON CONFLICT (")
            .push(target.to_owned())
            .push(") DO UPDATE SET ")
            .push(assignments.join(", "));
    }

    builder.push(" RETURNING *");
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_plain() {
        let builder = select("orders", &["*"], vec![], &[], None);
        assert_eq!(builder.sql(), "SELECT * FROM orders");
    }

    #[test]
    fn test_select_with_filters_and_limit() {
        let builder = select(
            "orders",
            &["id", "order_number"],
            vec![
                Filter::Eq("user_id", "abc".into()),
                Filter::Gte("total", 10i64.into()),
            ],
            &[],
            Some(5),
        );
        assert_eq!(
            builder.sql(),
            "SELECT id, order_number FROM orders WHERE user_id = $1 AND total >= $2 LIMIT $3"
        );
    }

    #[test]
    fn test_select_in_list() {
        let builder = select(
            "orders",
            &["*"],
            vec![Filter::In(
                "id",
                vec![1i64.into(), 2i64.into(), 3i64.into()],
            )],
            &[],
            None,
        );
        assert_eq!(
            builder.sql(),
            "SELECT * FROM orders WHERE id IN ($1, $2, $3)"
        );
    }

    #[test]
    fn test_select_joins() {
        let builder = select(
            "orders",
            &["orders.*"],
            vec![],
            &[
                Join {
                    kind: JoinKind::Left,
                    table: "shipping_addresses",
                    left: "orders.shipping_address_id",
                    right: "shipping_addresses.id",
                },
                Join {
                    kind: JoinKind::Inner,
                    table: "users",
                    left: "orders.user_id",
                    right: "users.client_id",
                },
            ],
            None,
        );
        assert_eq!(
            builder.sql(),
            "SELECT orders.* FROM orders \
             LEFT JOIN shipping_addresses ON orders.shipping_address_id = shipping_addresses.id \
             JOIN users ON orders.user_id = users.client_id"
        );
    }

    #[test]
    fn test_insert_returning() {
        let builder = insert(
            "shipping_addresses",
            &["user_id", "city"],
            vec!["u1".into(), "Austin".into()],
        );
        assert_eq!(
            builder.sql(),
            "INSERT INTO shipping_addresses (user_id, city) VALUES ($1, $2) RETURNING *"
        );
    }

    #[test]
    fn test_update_dynamic_set() {
        let builder = update(
            "users",
            vec![("first_name", "Jane".into()), ("height", SqlValue::Null)],
            vec![Filter::Eq("id", 3i64.into())],
        )
        .expect("non-empty update");
        assert_eq!(
            builder.sql(),
            "UPDATE users SET first_name = $1, height = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn test_update_rejects_empty_set() {
        let result = update("users", vec![], vec![]);
        assert!(matches!(result, Err(BuildError::EmptyUpdate)));
    }

    #[test]
    fn test_delete_with_in_filter() {
        let builder = delete(
            "orders",
            vec![Filter::In("id", vec![7i64.into(), 8i64.into()])],
        );
        assert_eq!(builder.sql(), "DELETE FROM orders WHERE id IN ($1, $2)");
    }

    #[test]
    fn test_upsert_without_conflict_target_is_plain_insert() {
        let builder = upsert(
            "clients",
            &["client_id", "email"],
            vec!["c1".into(), "a@b.c".into()],
            None,
            &[],
        )
        .expect("plain insert");
        assert_eq!(
            builder.sql(),
            "INSERT INTO clients (client_id, email) VALUES ($1, $2) RETURNING *"
        );
    }

    #[test]
    fn test_upsert_with_conflict_target() {
        let builder = upsert(
            "clients",
            &["client_id", "email", "height"],
            vec!["c1".into(), "a@b.c".into(), SqlValue::Null],
            Some("client_id"),
            &["client_id"],
        )
        .expect("upsert");
        assert_eq!(
            builder.sql(),
            "INSERT INTO clients (client_id, email, height) VALUES ($1, $2, $3) \
             ON CONFLICT (client_id) DO UPDATE SET email = EXCLUDED.email, \
             height = EXCLUDED.height RETURNING *"
        );
    }

    #[test]
    fn test_upsert_rejects_fully_excluded_update() {
        let result = upsert(
            "clients",
            &["client_id"],
            vec!["c1".into()],
            Some("client_id"),
            &["client_id"],
        );
        assert!(matches!(result, Err(BuildError::EmptyUpdate)));
    }
}
