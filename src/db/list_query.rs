use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgRow;
use std::collections::HashMap;

/// Control keys understood by the builder itself. Everything else in the
/// query map is treated as an equality filter.
pub const RESERVED_KEYS: &[&str] = &["searchTerm", "sortBy", "sortOrder", "page", "limit", "fields"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination metadata computed against the filtered (not paginated) row set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Builds a list query (search + filter + sort + pagination + projection)
/// from an untyped string-keyed query map, e.g. a parsed HTTP query string.
///
/// Stages are chainable and applied in a fixed order:
/// `search(..).filter().sort().paginate().limit_fields()`. Column names are
/// only ever taken from the allow-list handed to `new`, so the rendered SQL
/// never interpolates caller-controlled identifiers; values are bound.
///
/// Numeric inputs are parsed permissively: a `page` or `limit` that is
/// missing, non-numeric, zero or negative resolves to the default (page 1,
/// limit 10). In particular `page=0` behaves exactly like an absent page.
pub struct ListQuery {
    table: &'static str,
    columns: &'static [&'static str],
    query: HashMap<String, String>,
    search: Option<(Vec<&'static str>, String)>,
    filters: Vec<(&'static str, String)>,
    sort: Option<(&'static str, SortDirection)>,
    page: i64,
    limit: i64,
    paginated: bool,
    fields: Option<Vec<&'static str>>,
}

impl ListQuery {
    pub fn new(
        table: &'static str,
        columns: &'static [&'static str],
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            table,
            columns,
            query,
            search: None,
            filters: Vec::new(),
            sort: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            paginated: false,
            fields: None,
        }
    }

    /// Restrict to rows where any of `fields` contains `searchTerm` as a
    /// case-insensitive substring. Absent term is a no-op.
    pub fn search(mut self, fields: &[&'static str]) -> Self {
        if let Some(term) = self.query.get("searchTerm") {
            if !term.is_empty() {
                let fields: Vec<&'static str> = fields
                    .iter()
                    .copied()
                    .filter(|f| self.columns.contains(f))
                    .collect();
                if !fields.is_empty() {
                    self.search = Some((fields, term.clone()));
                }
            }
        }
        self
    }

    /// Turn every non-reserved query key into an equality predicate. Keys
    /// that are not known columns are dropped.
    pub fn filter(mut self) -> Self {
        for (key, value) in &self.query {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(column) = self.columns.iter().find(|c| **c == key.as_str()) {
                self.filters.push((column, value.clone()));
            }
        }
        // Deterministic predicate order regardless of map iteration.
        self.filters.sort_by_key(|(column, _)| *column);
        self
    }

    pub fn sort(mut self) -> Self {
        if let Some(sort_by) = self.query.get("sortBy") {
            if let Some(column) = self.columns.iter().find(|c| **c == sort_by.as_str()) {
                let direction = match self.query.get("sortOrder").map(String::as_str) {
                    Some("desc") => SortDirection::Desc,
                    _ => SortDirection::Asc,
                };
                self.sort = Some((column, direction));
            }
        }
        self
    }

    pub fn paginate(mut self) -> Self {
        let (page, limit) = self.page_and_limit();
        self.page = page;
        self.limit = limit;
        self.paginated = true;
        self
    }

    /// Comma-separated projection allow-list; absent means all columns.
    pub fn limit_fields(mut self) -> Self {
        if let Some(raw) = self.query.get("fields") {
            let selected: Vec<&'static str> = raw
                .split(',')
                .map(str::trim)
                .filter_map(|name| self.columns.iter().find(|c| **c == name).copied())
                .collect();
            if !selected.is_empty() {
                self.fields = Some(selected);
            }
        }
        self
    }

    /// The page/limit defaulting rule shared by `paginate` and `count_total`.
    pub fn page_and_limit(&self) -> (i64, i64) {
        (
            parse_positive(self.query.get("page")).unwrap_or(DEFAULT_PAGE),
            parse_positive(self.query.get("limit")).unwrap_or(DEFAULT_LIMIT),
        )
    }

    pub fn selected_fields(&self) -> Option<&[&'static str]> {
        self.fields.as_deref()
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some((fields, term)) = &self.search {
            binds.push(format!("%{}%", term));
            let placeholder = binds.len();
            let ors: Vec<String> = fields
                .iter()
                .map(|f| format!("{}::text ILIKE ${}", f, placeholder))
                .collect();
            clauses.push(format!("({})", ors.join(" OR ")));
        }

        for (column, value) in &self.filters {
            binds.push(value.clone());
            clauses.push(format!("{}::text = ${}", column, binds.len()));
        }

        if clauses.is_empty() {
            (String::new(), binds)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), binds)
        }
    }

    /// Render the full row-fetching statement. Projection is applied later,
    /// when rows are shaped for the response, so the statement always selects
    /// complete rows.
    pub fn select_sql(&self) -> (String, Vec<String>) {
        let (where_sql, binds) = self.where_clause();
        let mut sql = format!("SELECT * FROM {}{}", self.table, where_sql);

        if let Some((column, direction)) = &self.sort {
            sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
        }

        if self.paginated {
            let offset = (self.page - 1) * self.limit;
            sql.push_str(&format!(" LIMIT {} OFFSET {}", self.limit, offset));
        }

        (sql, binds)
    }

    /// Render the count statement for the search + filter stages only.
    pub fn count_sql(&self) -> (String, Vec<String>) {
        let (where_sql, binds) = self.where_clause();
        (
            format!("SELECT COUNT(*) FROM {}{}", self.table, where_sql),
            binds,
        )
    }

    /// Count rows matching the established filter and fold the result into
    /// pagination metadata, using the same page/limit defaulting as
    /// `paginate`.
    pub async fn count_total(&self, pool: &PgPool) -> Result<PageMeta, sqlx::Error> {
        let (sql, binds) = self.count_sql();
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let total = query.fetch_one(pool).await?;

        let (page, limit) = self.page_and_limit();
        Ok(PageMeta::new(page, limit, total))
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let (sql, binds) = self.select_sql();
        let mut query = sqlx::query_as::<_, T>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        query.fetch_all(pool).await
    }
}

fn parse_positive(value: Option<&String>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}

/// Keep only `fields` of a JSON object; non-objects pass through untouched.
pub fn project_fields(value: &serde_json::Value, fields: &[&'static str]) -> serde_json::Value {
    match value.as_object() {
        Some(map) => {
            let projected: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            serde_json::Value::Object(projected)
        }
        None => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &[
        "id", "owner", "brand", "model", "year", "price", "category", "description", "quantity",
        "in_stock", "image_url",
    ];

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn builder(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::new("products", COLUMNS, query(pairs))
    }

    #[test]
    fn paginate_defaults_to_first_page_of_ten() {
        let lq = builder(&[]).paginate();
        let (sql, _) = lq.select_sql();
        assert!(sql.ends_with("LIMIT 10 OFFSET 0"), "got: {}", sql);
    }

    #[test]
    fn page_zero_resolves_to_page_one() {
        let lq = builder(&[("page", "0")]);
        assert_eq!(lq.page_and_limit(), (1, 10));
    }

    #[test]
    fn non_numeric_page_resolves_to_page_one() {
        let lq = builder(&[("page", "abc"), ("limit", "two")]);
        assert_eq!(lq.page_and_limit(), (1, 10));
    }

    #[test]
    fn negative_inputs_fall_back_to_defaults() {
        let lq = builder(&[("page", "-3"), ("limit", "-1")]);
        assert_eq!(lq.page_and_limit(), (1, 10));
    }

    #[test]
    fn explicit_page_and_limit_are_used() {
        let lq = builder(&[("page", "3"), ("limit", "5")]).paginate();
        let (sql, _) = lq.select_sql();
        assert!(sql.ends_with("LIMIT 5 OFFSET 10"), "got: {}", sql);
    }

    #[test]
    fn filter_never_includes_reserved_keys() {
        let lq = builder(&[
            ("searchTerm", "civic"),
            ("sortBy", "price"),
            ("sortOrder", "desc"),
            ("page", "2"),
            ("limit", "5"),
            ("fields", "brand,model"),
            ("brand", "Honda"),
        ])
        .filter();

        let (sql, binds) = lq.select_sql();
        assert!(sql.contains("brand::text = $1"));
        assert_eq!(binds, vec!["Honda".to_string()]);
        for key in RESERVED_KEYS {
            assert!(!sql.contains(&format!("{}::text", key)), "leaked: {}", key);
        }
    }

    #[test]
    fn filter_drops_unknown_columns() {
        let lq = builder(&[("warp_drive", "yes"), ("brand", "Honda")]).filter();
        let (sql, binds) = lq.select_sql();
        assert!(!sql.contains("warp_drive"));
        assert_eq!(binds, vec!["Honda".to_string()]);
    }

    #[test]
    fn search_builds_case_insensitive_or_across_fields() {
        let lq = builder(&[("searchTerm", "civic")]).search(&["brand", "model", "category"]);
        let (sql, binds) = lq.select_sql();
        assert!(sql.contains("brand::text ILIKE $1"));
        assert!(sql.contains("OR model::text ILIKE $1"));
        assert!(sql.contains("OR category::text ILIKE $1"));
        assert_eq!(binds, vec!["%civic%".to_string()]);
    }

    #[test]
    fn absent_search_term_is_a_no_op() {
        let lq = builder(&[]).search(&["brand", "model"]);
        let (sql, binds) = lq.select_sql();
        assert_eq!(sql, "SELECT * FROM products");
        assert!(binds.is_empty());
    }

    #[test]
    fn search_and_filter_are_anded() {
        let lq = builder(&[("searchTerm", "sport"), ("category", "Coupe")])
            .search(&["brand", "model"])
            .filter();
        let (sql, binds) = lq.select_sql();
        assert!(sql.contains(") AND category::text = $2"), "got: {}", sql);
        assert_eq!(binds, vec!["%sport%".to_string(), "Coupe".to_string()]);
    }

    #[test]
    fn sort_descending_only_on_exact_desc() {
        let desc = builder(&[("sortBy", "price"), ("sortOrder", "desc")]).sort();
        assert!(desc.select_sql().0.contains("ORDER BY price DESC"));

        let asc = builder(&[("sortBy", "price"), ("sortOrder", "descending")]).sort();
        assert!(asc.select_sql().0.contains("ORDER BY price ASC"));

        let implicit = builder(&[("sortBy", "year")]).sort();
        assert!(implicit.select_sql().0.contains("ORDER BY year ASC"));
    }

    #[test]
    fn absent_sort_by_leaves_order_unspecified() {
        let lq = builder(&[("sortOrder", "desc")]).sort();
        assert!(!lq.select_sql().0.contains("ORDER BY"));
    }

    #[test]
    fn unknown_sort_column_is_ignored() {
        let lq = builder(&[("sortBy", "warp_drive")]).sort();
        assert!(!lq.select_sql().0.contains("ORDER BY"));
    }

    #[test]
    fn limit_fields_keeps_known_columns_only() {
        let lq = builder(&[("fields", "brand, model,warp_drive")]).limit_fields();
        assert_eq!(lq.selected_fields(), Some(&["brand", "model"][..]));
    }

    #[test]
    fn absent_fields_selects_everything() {
        let lq = builder(&[]).limit_fields();
        assert_eq!(lq.selected_fields(), None);
    }

    #[test]
    fn count_sql_ignores_sort_and_pagination() {
        let lq = builder(&[("page", "4"), ("limit", "2"), ("sortBy", "price"), ("brand", "Kia")])
            .filter()
            .sort()
            .paginate();
        let (sql, binds) = lq.count_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM products WHERE brand::text = $1");
        assert_eq!(binds, vec!["Kia".to_string()]);
    }

    #[test]
    fn page_meta_total_pages_is_ceiling() {
        assert_eq!(PageMeta::new(1, 10, 0).total_pages, 0);
        assert_eq!(PageMeta::new(1, 10, 1).total_pages, 1);
        assert_eq!(PageMeta::new(1, 10, 10).total_pages, 1);
        assert_eq!(PageMeta::new(1, 10, 11).total_pages, 2);
        assert_eq!(PageMeta::new(2, 3, 7).total_pages, 3);
    }

    #[test]
    fn project_fields_keeps_requested_keys() {
        let row = json!({"brand": "Honda", "model": "Civic", "price": 22000});
        let projected = project_fields(&row, &["brand", "model"]);
        assert_eq!(projected, json!({"brand": "Honda", "model": "Civic"}));
    }
}
