//! Appointment database operations and the per-patient report.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::api::NewAppointment;
use crate::models::{Appointment, DoctorRef, EntityId, PatientRef, Stat};

/// Appointment joined with its patient and doctor.
const APPOINTMENT_SELECT: &str = r#"
    SELECT a.id, a.date, a.time,
           p.id, p.name, p.email,
           d.id, d.name, d.specialty
    FROM appointments a
    JOIN patients p ON p.id = a.patient_id
    JOIN doctors d ON d.id = a.doctor_id
"#;

impl Database {
    /// Book an appointment. Both participants must exist.
    pub fn insert_appointment(&self, appointment: &NewAppointment) -> DbResult<Appointment> {
        if self.get_patient(appointment.patient_id)?.is_none() {
            return Err(DbError::Constraint(format!(
                "patient {} does not exist",
                appointment.patient_id
            )));
        }
        if self.get_doctor(appointment.doctor_id)?.is_none() {
            return Err(DbError::Constraint(format!(
                "doctor {} does not exist",
                appointment.doctor_id
            )));
        }

        self.conn.execute(
            "INSERT INTO appointments (date, time, patient_id, doctor_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                appointment.date,
                appointment.time,
                appointment.patient_id,
                appointment.doctor_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid() as EntityId;
        self.require(self.get_appointment(id)?, "appointment", id)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: EntityId) -> DbResult<Option<Appointment>> {
        let sql = format!("{APPOINTMENT_SELECT} WHERE a.id = ?");
        self.conn
            .query_row(&sql, [id], appointment_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// List all appointments in booking order.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let sql = format!("{APPOINTMENT_SELECT} ORDER BY a.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Appointment count per patient, busiest first.
    ///
    /// Patients without appointments are included with a count of zero.
    pub fn appointment_stats(&self) -> DbResult<Vec<Stat>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.name, COUNT(a.id) AS total_appointments
            FROM patients p
            LEFT JOIN appointments a ON a.patient_id = p.id
            GROUP BY p.id, p.name
            ORDER BY total_appointments DESC, p.name ASC, p.id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Stat {
                patient_id: row.get(0)?,
                name: row.get(1)?,
                total_appointments: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// Decode an [`APPOINTMENT_SELECT`] row starting at `offset`.
pub(super) fn appointment_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(offset)?,
        date: row.get(offset + 1)?,
        time: row.get(offset + 2)?,
        patient: PatientRef {
            id: row.get(offset + 3)?,
            name: row.get(offset + 4)?,
            email: row.get(offset + 5)?,
        },
        doctor: DoctorRef {
            id: row.get(offset + 6)?,
            name: row.get(offset + 7)?,
            specialty: row
                .get::<_, Option<String>>(offset + 8)?
                .filter(|s| !s.is_empty()),
        },
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    appointment_at(row, 0)
}
