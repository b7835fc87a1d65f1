//! Optional filters and paginated queries.
//!
//! Search endpoints accept criteria where every field is optional. A
//! [`Filters`] value collects only the criteria that were provided and
//! renders them as one `WHERE` clause, once for the `COUNT(*)` query and once
//! for the page query, so both always agree.
//!
//! ```ignore
//! let mut filters = Filters::new();
//! filters
//!     .where_optional("u.role", criteria.role.map(|r| r.to_string()))
//!     .where_optional("u.active", criteria.active)
//!     .where_string_query("u.email", criteria.email.as_ref());
//!
//! let page = fetch_page::<User>(
//!     pool,
//!     "SELECT u.* FROM users u",
//!     "SELECT COUNT(*) FROM users u",
//!     &filters,
//!     "u.created_at DESC",
//!     &criteria.pagination,
//! )
//! .await?;
//! ```
//!
//! Column names and SQL fragments are `&'static str`, so request data only
//! ever reaches the database as bind parameters.

use eduzas_core::{Paginated, PaginationMeta, PaginationParams, SearchType, StringQuery};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// A value bound into a filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    TextArray(Vec<String>),
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::TextArray(value)
    }
}

#[derive(Debug, Clone)]
enum Condition {
    /// `prefix $n suffix`
    Bound {
        prefix: String,
        value: FilterValue,
        suffix: &'static str,
    },
    /// `prefix $n infix $m suffix`
    Pair {
        prefix: &'static str,
        first: FilterValue,
        infix: &'static str,
        second: FilterValue,
        suffix: &'static str,
    },
    Fixed(&'static str),
}

/// Escapes `%`, `_` and `\` so user text matches literally inside `LIKE`.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Default)]
pub struct Filters {
    conditions: Vec<Condition>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Adds `column = value` when `value` is present.
    pub fn where_optional<V>(&mut self, column: &'static str, value: Option<V>) -> &mut Self
    where
        V: Into<FilterValue>,
    {
        if let Some(value) = value {
            self.conditions.push(Condition::Bound {
                prefix: format!("{} = ", column),
                value: value.into(),
                suffix: "",
            });
        }
        self
    }

    /// Adds an `EQUALS` or `LIKE` text condition when the query is present
    /// and its text is not blank.
    pub fn where_string_query(
        &mut self,
        column: &'static str,
        query: Option<&StringQuery>,
    ) -> &mut Self {
        let Some(query) = query.filter(|q| !q.is_blank()) else {
            return self;
        };

        let condition = match query.search_type {
            SearchType::Equals => Condition::Bound {
                prefix: format!("{} = ", column),
                value: FilterValue::Text(query.text.trim().to_string()),
                suffix: "",
            },
            SearchType::Like => Condition::Bound {
                prefix: format!("{} ILIKE ", column),
                value: FilterValue::Text(format!("%{}%", escape_like(query.text.trim()))),
                suffix: " ESCAPE '\\'",
            },
        };
        self.conditions.push(condition);
        self
    }

    /// Adds an arbitrary single-parameter condition, e.g. an `EXISTS`
    /// sub-select: `where_bound("EXISTS (... WHERE cs.student_id = ", id, ")")`.
    pub fn where_bound<V>(&mut self, prefix: &'static str, value: V, suffix: &'static str) -> &mut Self
    where
        V: Into<FilterValue>,
    {
        self.conditions.push(Condition::Bound {
            prefix: prefix.to_string(),
            value: value.into(),
            suffix,
        });
        self
    }

    /// Same as [`Filters::where_bound`] but only when `value` is present.
    pub fn where_bound_optional<V>(
        &mut self,
        prefix: &'static str,
        value: Option<V>,
        suffix: &'static str,
    ) -> &mut Self
    where
        V: Into<FilterValue>,
    {
        if let Some(value) = value {
            self.where_bound(prefix, value, suffix);
        }
        self
    }

    /// Adds a two-parameter condition, for sub-selects that must tie both
    /// values to the same row.
    pub fn where_bound_pair<A, B>(
        &mut self,
        prefix: &'static str,
        first: A,
        infix: &'static str,
        second: B,
        suffix: &'static str,
    ) -> &mut Self
    where
        A: Into<FilterValue>,
        B: Into<FilterValue>,
    {
        self.conditions.push(Condition::Pair {
            prefix,
            first: first.into(),
            infix,
            second: second.into(),
            suffix,
        });
        self
    }

    /// Adds a condition without parameters.
    pub fn where_fixed(&mut self, sql: &'static str) -> &mut Self {
        self.conditions.push(Condition::Fixed(sql));
        self
    }

    /// Renders ` WHERE c1 AND c2 ...` into the builder, or nothing.
    pub fn push_where<'args>(&self, builder: &mut QueryBuilder<'args, Postgres>) {
        for (index, condition) in self.conditions.iter().enumerate() {
            builder.push(if index == 0 { " WHERE " } else { " AND " });
            match condition {
                Condition::Bound {
                    prefix,
                    value,
                    suffix,
                } => {
                    builder.push(prefix.as_str());
                    push_value(builder, value.clone());
                    builder.push(*suffix);
                }
                Condition::Pair {
                    prefix,
                    first,
                    infix,
                    second,
                    suffix,
                } => {
                    builder.push(*prefix);
                    push_value(builder, first.clone());
                    builder.push(*infix);
                    push_value(builder, second.clone());
                    builder.push(*suffix);
                }
                Condition::Fixed(sql) => {
                    builder.push(*sql);
                }
            }
        }
    }
}

fn push_value<'args>(builder: &mut QueryBuilder<'args, Postgres>, value: FilterValue) {
    match value {
        FilterValue::Bool(v) => builder.push_bind(v),
        FilterValue::Int(v) => builder.push_bind(v),
        FilterValue::Text(v) => builder.push_bind(v),
        FilterValue::Uuid(v) => builder.push_bind(v),
        FilterValue::TextArray(v) => builder.push_bind(v),
    };
}

/// Builds the page query: `select_sql WHERE ... ORDER BY order_by LIMIT $n OFFSET $m`.
pub fn page_query<'args>(
    select_sql: &str,
    filters: &Filters,
    order_by: &'static str,
    params: &PaginationParams,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(select_sql);
    filters.push_where(&mut builder);
    builder.push(" ORDER BY ");
    builder.push(order_by);
    builder.push(" LIMIT ");
    builder.push_bind(params.limit());
    builder.push(" OFFSET ");
    builder.push_bind(params.offset());
    builder
}

/// Builds the total query: `count_sql WHERE ...`.
pub fn count_query<'args>(count_sql: &str, filters: &Filters) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(count_sql);
    filters.push_where(&mut builder);
    builder
}

/// Runs the count and page queries with the same filters.
pub async fn fetch_page<T>(
    pool: &PgPool,
    select_sql: &str,
    count_sql: &str,
    filters: &Filters,
    order_by: &'static str,
    params: &PaginationParams,
) -> Result<Paginated<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count = count_query(count_sql, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    if params.offset() >= total {
        debug!(total, offset = params.offset(), "Requested page is past the end");
        return Ok(Paginated::new(Vec::new(), PaginationMeta::new(total, params)));
    }

    let mut page = page_query(select_sql, filters, order_by, params);
    let rows = page.build_query_as::<T>().fetch_all(pool).await?;

    debug!(total, returned = rows.len(), filters = filters.len(), "Fetched page");
    Ok(Paginated::new(rows, PaginationMeta::new(total, params)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filters: &Filters) -> String {
        count_query("SELECT COUNT(*) FROM users u", filters)
            .sql()
            .to_string()
    }

    #[test]
    fn test_empty_filters_render_nothing() {
        let filters = Filters::new();
        assert!(filters.is_empty());
        assert_eq!(rendered(&filters), "SELECT COUNT(*) FROM users u");
    }

    #[test]
    fn test_where_optional_skips_none() {
        let mut filters = Filters::new();
        filters
            .where_optional("u.active", None::<bool>)
            .where_optional("u.role", Some("ADMIN"))
            .where_optional("u.id", None::<Uuid>);

        assert_eq!(filters.len(), 1);
        assert_eq!(
            rendered(&filters),
            "SELECT COUNT(*) FROM users u WHERE u.role = $1"
        );
    }

    #[test]
    fn test_placeholders_are_sequential() {
        let mut filters = Filters::new();
        filters
            .where_optional("u.role", Some("STUDENT"))
            .where_optional("u.active", Some(true))
            .where_string_query("u.email", Some(&StringQuery::like("ana")));

        assert_eq!(
            rendered(&filters),
            "SELECT COUNT(*) FROM users u WHERE u.role = $1 AND u.active = $2 AND u.email ILIKE $3 ESCAPE '\\'"
        );
    }

    #[test]
    fn test_string_query_equals() {
        let mut filters = Filters::new();
        filters.where_string_query("u.first_name", Some(&StringQuery::equals("Ana")));
        assert_eq!(
            rendered(&filters),
            "SELECT COUNT(*) FROM users u WHERE u.first_name = $1"
        );
    }

    #[test]
    fn test_string_query_equals_binds_trimmed_text() {
        let mut filters = Filters::new();
        filters.where_string_query("u.first_name", Some(&StringQuery::equals(" Ana ")));

        match &filters.conditions[0] {
            Condition::Bound { value, .. } => {
                assert_eq!(value, &FilterValue::Text("Ana".to_string()));
            }
            _ => panic!("expected a bound condition"),
        }
    }

    #[test]
    fn test_blank_string_query_is_ignored() {
        let mut filters = Filters::new();
        filters
            .where_string_query("u.first_name", Some(&StringQuery::like("  ")))
            .where_string_query("u.email", None);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_like_value_is_wrapped_and_escaped() {
        let mut filters = Filters::new();
        filters.where_string_query("c.class_name", Some(&StringQuery::like(" 50%_off\\ ")));

        match &filters.conditions[0] {
            Condition::Bound { value, .. } => {
                assert_eq!(value, &FilterValue::Text("%50\\%\\_off\\\\%".to_string()));
            }
            _ => panic!("expected a bound condition"),
        }
    }

    #[test]
    fn test_where_bound_and_fixed() {
        let mut filters = Filters::new();
        filters
            .where_bound(
                "EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = ",
                Uuid::nil(),
                ")",
            )
            .where_fixed("c.active")
            .where_bound_optional("c.subject = ", None::<String>, "");

        assert_eq!(
            rendered(&filters),
            "SELECT COUNT(*) FROM users u WHERE EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = $1) AND c.active"
        );
    }

    #[test]
    fn test_where_bound_pair_numbers_both_values() {
        let mut filters = Filters::new();
        filters
            .where_optional("t.active", Some(true))
            .where_bound_pair(
                "EXISTS (SELECT 1 FROM class_students cs WHERE cs.student_id = ",
                Uuid::nil(),
                " AND cs.class_id = ",
                "ABCD1234",
                ")",
            );

        assert_eq!(
            rendered(&filters),
            "SELECT COUNT(*) FROM users u WHERE t.active = $1 AND EXISTS (SELECT 1 FROM class_students cs WHERE cs.student_id = $2 AND cs.class_id = $3)"
        );
    }

    #[test]
    fn test_page_query_appends_order_and_limits() {
        let mut filters = Filters::new();
        filters.where_optional("u.active", Some(true));
        let params = PaginationParams {
            limit: Some(20),
            offset: None,
            page: Some(2),
        };

        let builder = page_query("SELECT u.* FROM users u", &filters, "u.created_at DESC", &params);
        assert_eq!(
            builder.sql(),
            "SELECT u.* FROM users u WHERE u.active = $1 ORDER BY u.created_at DESC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
    }
}
