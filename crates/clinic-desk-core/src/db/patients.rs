//! Patient and doctor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::api::{NewDoctor, NewPatient};
use crate::models::{Doctor, EntityId, Patient};

impl Database {
    /// Insert a patient, returning the stored row.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<Patient> {
        self.conn.execute(
            "INSERT INTO patients (name, email, birthdate) VALUES (?1, ?2, ?3)",
            params![patient.name, patient.email, patient.birthdate],
        )?;
        let id = self.conn.last_insert_rowid() as EntityId;
        self.require(self.get_patient(id)?, "patient", id)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: EntityId) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, name, email, birthdate FROM patients WHERE id = ?",
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients in insertion order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, birthdate FROM patients ORDER BY id")?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a doctor, returning the stored row.
    pub fn insert_doctor(&self, doctor: &NewDoctor) -> DbResult<Doctor> {
        self.conn.execute(
            "INSERT INTO doctors (name, specialty) VALUES (?1, ?2)",
            params![doctor.name, doctor.specialty],
        )?;
        let id = self.conn.last_insert_rowid() as EntityId;
        self.require(self.get_doctor(id)?, "doctor", id)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: EntityId) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                "SELECT id, name, specialty FROM doctors WHERE id = ?",
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all doctors in insertion order.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, specialty FROM doctors ORDER BY id")?;
        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        birthdate: row.get(3)?,
    })
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
    })
}
