//! Batched insert-or-update of user-owned rows.
//!
//! Every row written is prefixed with the owning user's identity, so the owner column is
//! always supplied by the server and never by the client. One statement is issued per
//! batch regardless of its length and an empty batch issues nothing. On a conflict with
//! an existing row, every non-key column is overwritten with the incoming value.

use crate::db::{BindValue, DaoError, SqlExecutor};

pub const OWNER_COLUMN: &str = "user_id";

pub trait UpsertRow {
    /// Human-readable name of the entity kind
    const KIND: &'static str;
    const TABLE: &'static str;
    /// Columns that follow the owner column, in bind order
    const COLUMNS: &'static [&'static str];
    /// Columns that, together with the owner column, identify a row
    const KEY_COLUMNS: &'static [&'static str];

    /// Pushes exactly one value per entry in `COLUMNS`, in the same order.
    fn push_binds(&self, binds: &mut Vec<BindValue>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpsertStatement {
    sql: String,
    binds: Vec<BindValue>,
    row_count: usize,
}

impl UpsertStatement {
    /// Returns `None` when there are no rows, as a zero-row `VALUES` list is not a valid
    /// statement.
    pub fn build<R: UpsertRow>(owner: &str, rows: &[R]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let columns_per_row = R::COLUMNS.len() + 1;
        let mut binds = Vec::with_capacity(rows.len() * columns_per_row);

        let mut sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ",
            R::TABLE,
            OWNER_COLUMN,
            R::COLUMNS.join(", "),
        );

        for (row_idx, row) in rows.iter().enumerate() {
            if row_idx > 0 {
                sql.push_str(", ");
            }

            sql.push('(');
            for col_idx in 0..columns_per_row {
                if col_idx > 0 {
                    sql.push_str(", ");
                }

                sql.push_str(&format!("${}", row_idx * columns_per_row + col_idx + 1));
            }
            sql.push(')');

            binds.push(BindValue::Text(String::from(owner)));
            row.push_binds(&mut binds);

            debug_assert_eq!(binds.len(), (row_idx + 1) * columns_per_row);
        }

        sql.push_str(&format!(
            " ON CONFLICT ({}, {})",
            OWNER_COLUMN,
            R::KEY_COLUMNS.join(", "),
        ));

        let updated_columns = R::COLUMNS
            .iter()
            .filter(|c| !R::KEY_COLUMNS.contains(*c))
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>();

        if updated_columns.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(&format!(" DO UPDATE SET {}", updated_columns.join(", ")));
        }

        Some(Self {
            sql,
            binds,
            row_count: rows.len(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Writes `rows` for `owner` in a single statement. Errors from the executor are returned
/// unchanged and nothing is retried.
pub fn upsert<E, R>(executor: &E, owner: &str, rows: &[R]) -> Result<(), DaoError>
where
    E: SqlExecutor,
    R: UpsertRow,
{
    let Some(statement) = UpsertStatement::build(owner, rows) else {
        return Ok(());
    };

    log::debug!(
        "Upserting {} {} row(s)",
        statement.row_count(),
        R::KIND,
    );

    executor.execute(statement.sql(), statement.binds())?;

    Ok(())
}
