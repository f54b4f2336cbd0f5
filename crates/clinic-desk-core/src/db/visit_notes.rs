//! Visit note database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::appointments::appointment_at;
use super::{Database, DbError, DbResult};
use crate::api::NewVisitNote;
use crate::models::{EntityId, VisitNote};

const VISIT_NOTE_SELECT: &str = r#"
    SELECT v.id, v.note, v.prescription,
           a.id, a.date, a.time,
           p.id, p.name, p.email,
           d.id, d.name, d.specialty
    FROM visit_notes v
    JOIN appointments a ON a.id = v.appointment_id
    JOIN patients p ON p.id = a.patient_id
    JOIN doctors d ON d.id = a.doctor_id
"#;

impl Database {
    /// Record a note against an existing appointment.
    pub fn insert_visit_note(&self, note: &NewVisitNote) -> DbResult<VisitNote> {
        if self.get_appointment(note.appointment_id)?.is_none() {
            return Err(DbError::Constraint(format!(
                "appointment {} does not exist",
                note.appointment_id
            )));
        }

        self.conn.execute(
            "INSERT INTO visit_notes (appointment_id, note, prescription) VALUES (?1, ?2, ?3)",
            params![note.appointment_id, note.note, note.prescription],
        )?;
        let id = self.conn.last_insert_rowid() as EntityId;
        self.require(self.get_visit_note(id)?, "visit note", id)
    }

    /// Get a visit note by ID.
    pub fn get_visit_note(&self, id: EntityId) -> DbResult<Option<VisitNote>> {
        let sql = format!("{VISIT_NOTE_SELECT} WHERE v.id = ?");
        self.conn
            .query_row(&sql, [id], visit_note_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// List all visit notes in creation order.
    pub fn list_visit_notes(&self) -> DbResult<Vec<VisitNote>> {
        let sql = format!("{VISIT_NOTE_SELECT} ORDER BY v.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], visit_note_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a visit note. Missing notes are reported as [`DbError::NotFound`].
    pub fn delete_visit_note(&self, id: EntityId) -> DbResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM visit_notes WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(DbError::NotFound(format!("visit note {id}")));
        }
        Ok(())
    }
}

fn visit_note_from_row(row: &Row<'_>) -> rusqlite::Result<VisitNote> {
    Ok(VisitNote {
        id: row.get(0)?,
        note: row.get(1)?,
        prescription: row.get(2)?,
        appointment: appointment_at(row, 3)?,
    })
}
