//! Read-time patient expansion shared by appointments and prescriptions.

use rusqlite::Row;

use crate::models::PatientSummary;

/// Which patient display fields to attach to a joined record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientExpansion {
    /// Names and business identifier
    Basic,
    /// Basic plus phone
    WithContact,
}

impl PatientExpansion {
    /// Columns selected from the `p` alias of a `LEFT JOIN patients p`.
    pub(crate) const COLUMNS: &'static str = "p.first_name, p.last_name, p.patient_code, p.phone";

    /// Read the joined columns starting at `offset`. A missing patient (no
    /// match in the left join) yields `None`.
    pub(crate) fn read(self, row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<PatientSummary>> {
        let first_name: Option<String> = row.get(offset)?;
        let Some(first_name) = first_name else {
            return Ok(None);
        };

        let phone = match self {
            PatientExpansion::Basic => None,
            PatientExpansion::WithContact => row.get(offset + 3)?,
        };

        Ok(Some(PatientSummary {
            first_name,
            last_name: row.get(offset + 1)?,
            patient_code: row.get(offset + 2)?,
            phone,
        }))
    }
}
