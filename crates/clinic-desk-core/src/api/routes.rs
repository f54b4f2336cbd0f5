//! Paths of the backend REST surface.

use crate::models::EntityId;

pub const PATIENTS: &str = "/patients";
pub const DOCTORS: &str = "/doctors";
pub const APPOINTMENTS: &str = "/appointments";
pub const VISIT_NOTES: &str = "/visit-notes";

/// Stored-procedure report. The body is an array whose first element is the
/// list of rows.
pub const APPOINTMENT_STATS: &str = "/appointments/stored-procedure/stats";

/// Path of a single visit note.
pub fn visit_note(id: EntityId) -> String {
    format!("{VISIT_NOTES}/{id}")
}

/// Parse the id out of `/visit-notes/{id}`.
pub fn parse_visit_note(path: &str) -> Option<EntityId> {
    path.strip_prefix(VISIT_NOTES)?
        .strip_prefix('/')?
        .parse()
        .ok()
}
