//! Filter/sort/search projections over a collection.
//!
//! Every function here is pure: it borrows the source and returns a new
//! ordered list of references, leaving the source untouched.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Doctor, EntityId, Patient};

/// Something that can appear in a searchable roster.
pub trait RosterEntry {
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    /// Category used by the exact-match filter, if the entry has one.
    fn specialty(&self) -> Option<&str> {
        None
    }
}

impl RosterEntry for Doctor {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn specialty(&self) -> Option<&str> {
        Some(&self.specialty)
    }
}

impl RosterEntry for Patient {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sort direction toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Ephemeral view state of a roster screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterQuery {
    /// Case-insensitive substring of the name; empty keeps everything
    pub name_filter: String,
    /// Case-insensitive exact specialty; `None` or empty keeps everything
    pub specialty: Option<String>,
    pub direction: SortDirection,
}

impl RosterQuery {
    pub fn with_name(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = filter.into();
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Flip the sort direction.
    pub fn toggle_direction(&mut self) {
        self.direction = self.direction.toggled();
    }

    /// Filter and sort `source`.
    pub fn apply<'a, T: RosterEntry>(&self, source: &'a [T]) -> Vec<&'a T> {
        let needle = self.name_filter.to_lowercase();
        let specialty = self
            .specialty
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut result: Vec<&T> = source
            .iter()
            .filter(|entry| entry.name().to_lowercase().contains(&needle))
            .filter(|entry| match &specialty {
                None => true,
                Some(wanted) => entry
                    .specialty()
                    .is_some_and(|s| s.to_lowercase() == *wanted),
            })
            .collect();

        sort_entries(&mut result, self.direction);
        result
    }
}

/// Sort entries by name in place.
pub fn sort_entries<T: RosterEntry>(entries: &mut [&T], direction: SortDirection) {
    entries.sort_by(|a, b| {
        let ordering = compare_entries(*a, *b);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Name collation: by [`collation_key`], then case-insensitively with accents,
/// then the exact name, then the id.
///
/// The tie-breakers make this a total order over entries with distinct ids,
/// so descending order is exactly the reverse of ascending order.
pub fn compare_entries<T: RosterEntry>(a: &T, b: &T) -> Ordering {
    compare_names(a.name(), b.name()).then_with(|| a.id().cmp(&b.id()))
}

/// Accent- and case-insensitive name comparison, so "Élodie" sorts with the
/// E's rather than after "Z". Names equal under that fold are ordered
/// case-insensitively, then exactly.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Primary sort key: canonical decomposition with combining marks removed,
/// lowercased.
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Distinct non-empty specialties of the unfiltered source, in first-seen order.
pub fn specialty_options<T: RosterEntry>(source: &[T]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for specialty in source.iter().filter_map(|entry| entry.specialty()) {
        if !specialty.is_empty() && !seen.iter().any(|s| s == specialty) {
            seen.push(specialty.to_string());
        }
    }
    seen
}
