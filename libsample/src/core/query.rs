//! utilities related to database queries
//!
//! Multi-row inserts are assembled from positional placeholders (`$1`, `$2`,
//! ...) rather than through [sqlx::QueryBuilder] so that the statement text
//! and the argument order can be inspected without a database connection.
use sqlx::{Sqlite, query::Query, sqlite::SqliteArguments};

/// A single value to bind to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl BindValue {
    /// Bind this value to the next positional parameter of `query`
    pub fn bind_to<'q>(
        self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            BindValue::Integer(v) => query.bind(v),
            BindValue::Real(v) => query.bind(v),
            BindValue::Text(v) => query.bind(v),
        }
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i16> for BindValue {
    fn from(value: i16) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The largest number of bound parameters sqlite accepts in one statement
pub const MAX_BIND_VARIABLES: usize = 32766;

/// A trait implemented by rows that are stored in a child table and are
/// inserted together, keyed by the id of their parent row.
pub trait ChildRow {
    /// The names of the value columns, not including the parent key column
    const COLUMNS: &'static [&'static str];

    /// The most rows that fit in a single [MultiRowInsert]. Each row binds
    /// its parent key plus one value per column.
    const MAX_ROWS: usize = MAX_BIND_VARIABLES / (Self::COLUMNS.len() + 1);

    /// The values for [Self::COLUMNS], in the same order
    fn values(&self) -> Vec<BindValue>;
}

/// Generate `rows` groups of `columns` positional placeholders each, e.g.
/// `($1, $2), ($3, $4)` for two rows of two columns. Also returns the flat
/// list of 1-based indices in the order they appear in the text.
pub fn placeholder_groups(rows: usize, columns: usize) -> (String, Vec<usize>) {
    let indices: Vec<usize> = (1..=rows * columns).collect();
    let text = indices
        .chunks(columns.max(1))
        .map(|group| {
            let params = group
                .iter()
                .map(|i| format!("${i}"))
                .collect::<Vec<String>>()
                .join(", ");
            format!("({params})")
        })
        .collect::<Vec<String>>()
        .join(", ");
    (text, indices)
}

/// A fully assembled `INSERT ... VALUES (...), (...) RETURNING ...`
/// statement for a batch of child rows, together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRowInsert {
    sql: String,
    args: Vec<BindValue>,
    rows: usize,
}

impl MultiRowInsert {
    /// Build an insert statement for `rows`, all belonging to the parent row
    /// `parent_id`. The parent id is stored in `parent_column` and is the
    /// first value of every row. Returns `None` when there is nothing to
    /// insert.
    pub fn new<R: ChildRow>(
        table: &str,
        parent_column: &str,
        parent_id: i64,
        rows: &[R],
        returning: &[&str],
    ) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let columns = 1 + R::COLUMNS.len();
        let (placeholders, _) = placeholder_groups(rows.len(), columns);
        let mut sql = format!(
            "INSERT INTO {table} ({parent_column}, {}) VALUES {placeholders}",
            R::COLUMNS.join(", ")
        );
        if !returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&returning.join(", "));
        }

        let mut args = Vec::with_capacity(rows.len() * columns);
        for row in rows {
            let values = row.values();
            debug_assert_eq!(values.len(), R::COLUMNS.len());
            args.push(BindValue::Integer(parent_id));
            args.extend(values);
        }

        Some(Self {
            sql,
            args,
            rows: rows.len(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[BindValue] {
        &self.args
    }

    /// The number of rows this statement will insert
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Create an executable query with all arguments bound
    pub fn build(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.args
            .iter()
            .cloned()
            .fold(sqlx::query(&self.sql), |query, arg| arg.bind_to(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockRow {
        label: String,
        weight: f64,
        rank: i16,
        note: String,
    }

    impl ChildRow for MockRow {
        const COLUMNS: &'static [&'static str] = &["label", "weight", "rank", "note"];

        fn values(&self) -> Vec<BindValue> {
            vec![
                self.label.as_str().into(),
                self.weight.into(),
                self.rank.into(),
                self.note.as_str().into(),
            ]
        }
    }

    fn mock_rows(n: usize) -> Vec<MockRow> {
        (0..n)
            .map(|i| MockRow {
                label: format!("label {i}"),
                weight: i as f64 * 0.5,
                rank: i as i16,
                note: format!("note {i}"),
            })
            .collect()
    }

    #[test]
    fn test_placeholder_groups_text() {
        assert_eq!(placeholder_groups(1, 1), ("($1)".to_string(), vec![1]));
        assert_eq!(
            placeholder_groups(2, 5).0,
            "($1, $2, $3, $4, $5), ($6, $7, $8, $9, $10)"
        );
        assert_eq!(placeholder_groups(0, 5), (String::new(), vec![]));
    }

    #[test]
    fn test_placeholder_groups_indices() {
        for rows in 1..=12 {
            let (text, indices) = placeholder_groups(rows, 5);
            assert_eq!(indices.len(), rows * 5);
            assert_eq!(text.matches('(').count(), rows);
            for (g, group) in indices.chunks(5).enumerate() {
                assert_eq!(group.len(), 5);
                assert_eq!(group[0], g * 5 + 1);
                assert!(group.windows(2).all(|w| w[0] < w[1]));
            }
            // every index appears exactly once in the text
            for i in &indices {
                assert_eq!(
                    text.split(|c: char| c == '(' || c == ')' || c == ',')
                        .filter(|p| p.trim() == format!("${i}"))
                        .count(),
                    1
                );
            }
        }
    }

    #[test]
    fn test_max_rows_fit_bind_limit() {
        assert_eq!(MockRow::MAX_ROWS, 6553);
        let (_, indices) = placeholder_groups(MockRow::MAX_ROWS, MockRow::COLUMNS.len() + 1);
        assert!(indices.len() <= MAX_BIND_VARIABLES);
        let (_, indices) =
            placeholder_groups(MockRow::MAX_ROWS + 1, MockRow::COLUMNS.len() + 1);
        assert!(indices.len() > MAX_BIND_VARIABLES);
    }

    #[test]
    fn test_multi_row_insert_empty() {
        let rows: Vec<MockRow> = vec![];
        assert!(MultiRowInsert::new("child", "parent", 7, &rows, &["label"]).is_none());
    }

    #[test]
    fn test_multi_row_insert_sql() {
        let rows = mock_rows(2);
        let insert = MultiRowInsert::new("child", "parent", 7, &rows, &["label", "rank"])
            .expect("insert should be built");
        assert_eq!(
            insert.sql(),
            "INSERT INTO child (parent, label, weight, rank, note) VALUES \
             ($1, $2, $3, $4, $5), ($6, $7, $8, $9, $10) RETURNING label, rank"
        );
        assert_eq!(insert.rows(), 2);
    }

    #[test]
    fn test_multi_row_insert_args() {
        let rows = mock_rows(4);
        let insert =
            MultiRowInsert::new("child", "parent", 31, &rows, &[]).expect("insert should be built");
        assert!(!insert.sql().contains("RETURNING"));
        let args = insert.args();
        assert_eq!(args.len(), 4 * 5);
        for (i, group) in args.chunks(5).enumerate() {
            assert_eq!(group[0], BindValue::Integer(31));
            assert_eq!(group[1], BindValue::Text(format!("label {i}")));
            assert_eq!(group[2], BindValue::Real(i as f64 * 0.5));
            assert_eq!(group[3], BindValue::Integer(i as i64));
            assert_eq!(group[4], BindValue::Text(format!("note {i}")));
        }
    }
}
