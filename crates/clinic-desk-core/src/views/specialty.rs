//! Suggested doctor specialties.
//!
//! Specialty is free text on the backend; the list below only drives input
//! suggestions.

use strsim::jaro_winkler;

/// Specialties offered as suggestions when registering a doctor.
pub const SPECIALTIES: [&str; 10] = [
    "General Practitioner",
    "Cardiologist",
    "Dermatologist",
    "Pediatrician",
    "Surgeon",
    "Neurologist",
    "Psychiatrist",
    "Radiologist",
    "Ophthalmologist",
    "Other",
];

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Suggested specialties starting with the typed prefix (case-insensitive).
pub fn matching_specialties(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    SPECIALTIES
        .iter()
        .copied()
        .filter(|s| s.to_lowercase().starts_with(&prefix))
        .collect()
}

/// Closest suggested specialty for free-text input, if one is close enough.
///
/// Exact case-insensitive matches win outright; otherwise the best
/// Jaro-Winkler score at or above the threshold.
pub fn suggest_specialty(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    if let Some(exact) = SPECIALTIES
        .iter()
        .copied()
        .find(|s| s.to_lowercase() == input)
    {
        return Some(exact);
    }

    SPECIALTIES
        .iter()
        .map(|s| (*s, jaro_winkler(&input, &s.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(s, _)| s)
}
