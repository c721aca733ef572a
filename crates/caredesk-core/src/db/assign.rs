//! Partial-update statement builder.

use rusqlite::{params_from_iter, ToSql};

use super::{Database, DbResult};

/// Column assignments collected from a partial update.
#[derive(Default)]
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Always assign `column`, including to NULL.
    pub(crate) fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: T) -> &mut Self {
        self.columns.push(column);
        self.values.push(Box::new(value));
        self
    }

    /// Assign `column` only when a value was supplied.
    pub(crate) fn maybe<T: ToSql + 'static>(
        &mut self,
        column: &'static str,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Run `UPDATE table SET ... WHERE id = key`, refreshing `updated_at`.
    /// Returns the number of rows affected.
    pub(crate) fn apply(self, db: &Database, table: &str, key: &str) -> DbResult<usize> {
        let mut set_clause: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        set_clause.push("updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')".to_string());

        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            set_clause.join(", "),
            self.columns.len() + 1
        );

        let mut values = self.values;
        values.push(Box::new(key.to_string()));

        let rows_affected = db.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maybe_skips_none() {
        let mut assignments = Assignments::new();
        assignments
            .maybe::<String>("phone", None)
            .maybe("email", Some("a@b.c".to_string()));
        assert_eq!(assignments.columns, vec!["email"]);
    }

    #[test]
    fn test_apply_missing_key_affects_nothing() {
        let db = Database::open_in_memory().unwrap();
        let mut assignments = Assignments::new();
        assignments.set("phone", "555".to_string());
        let rows = assignments.apply(&db, "patients", "missing").unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_apply_sets_null() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO patients (id, first_name, last_name, phone) VALUES ('k', 'Ann', 'Lee', '555')",
                [],
            )
            .unwrap();

        let mut assignments = Assignments::new();
        assignments.set("phone", None::<String>);
        assert_eq!(assignments.apply(&db, "patients", "k").unwrap(), 1);

        let phone: Option<String> = db
            .conn()
            .query_row("SELECT phone FROM patients WHERE id = 'k'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(phone, None);
    }
}
