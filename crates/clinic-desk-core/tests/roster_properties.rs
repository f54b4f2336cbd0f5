//! Property tests for roster filtering and ordering.

use proptest::prelude::*;

use clinic_desk_core::models::{Doctor, Stat};
use clinic_desk_core::stats::{aggregate, Severity};
use clinic_desk_core::views::{
    collation_key, compare_entries, sort_entries, specialty_options, RosterQuery, SortDirection,
};

fn doctor_strategy() -> impl Strategy<Value = Doctor> {
    (
        1u64..50,
        "[A-Za-zÀÉÈÇÖÜàéèçöü]{0,6}",
        prop::sample::select(vec!["Surgeon", "surgeon", "Pediatrician", ""]),
    )
        .prop_map(|(id, name, specialty)| Doctor {
            id,
            name,
            specialty: specialty.to_string(),
        })
}

fn roster() -> impl Strategy<Value = Vec<Doctor>> {
    prop::collection::vec(doctor_strategy(), 0..20)
}

fn ids(doctors: &[&Doctor]) -> Vec<(u64, String)> {
    doctors.iter().map(|d| (d.id, d.name.clone())).collect()
}

proptest! {
    #[test]
    fn filtered_entries_all_match(doctors in roster(), needle in "[a-z]{0,2}") {
        let query = RosterQuery::default().with_name(needle.clone());
        let result = query.apply(&doctors);

        for doctor in &result {
            prop_assert!(doctor.name.to_lowercase().contains(&needle));
        }
        let expected = doctors
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&needle))
            .count();
        prop_assert_eq!(result.len(), expected);
    }

    #[test]
    fn specialty_filter_is_case_insensitive_exact(doctors in roster()) {
        let query = RosterQuery::default().with_specialty("SURGEON");
        let result = query.apply(&doctors);

        prop_assert!(result.iter().all(|d| d.specialty.eq_ignore_ascii_case("surgeon")));
        let expected = doctors
            .iter()
            .filter(|d| d.specialty.eq_ignore_ascii_case("surgeon"))
            .count();
        prop_assert_eq!(result.len(), expected);
    }

    #[test]
    fn ascending_is_sorted_and_descending_reverses_it(doctors in roster()) {
        let mut query = RosterQuery::default();
        let asc = query.apply(&doctors);
        for pair in asc.windows(2) {
            prop_assert!(compare_entries(pair[0], pair[1]).is_le());
        }

        query.toggle_direction();
        prop_assert_eq!(query.direction, SortDirection::Desc);
        let mut desc = query.apply(&doctors);
        desc.reverse();
        prop_assert_eq!(ids(&asc), ids(&desc));
    }

    #[test]
    fn ascending_order_follows_accent_folded_names(doctors in roster()) {
        let asc = RosterQuery::default().apply(&doctors);
        for pair in asc.windows(2) {
            prop_assert!(collation_key(&pair[0].name) <= collation_key(&pair[1].name));
        }
    }

    #[test]
    fn sorting_a_sorted_roster_changes_nothing(doctors in roster()) {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sorted = RosterQuery::default().with_direction(direction).apply(&doctors);
            let mut again = sorted.clone();
            sort_entries(&mut again, direction);
            prop_assert_eq!(ids(&again), ids(&sorted));
        }
    }

    #[test]
    fn apply_is_deterministic_and_leaves_source_alone(doctors in roster()) {
        let before = doctors.clone();
        let query = RosterQuery::default().with_direction(SortDirection::Desc);

        let first = ids(&query.apply(&doctors));
        let second = ids(&query.apply(&doctors));
        prop_assert_eq!(first, second);
        prop_assert_eq!(doctors, before);
    }

    #[test]
    fn specialty_options_are_distinct(doctors in roster()) {
        let options = specialty_options(&doctors);
        let mut deduped = options.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(options.len(), deduped.len());
    }

    #[test]
    fn scales_stay_in_range(totals in prop::collection::vec(0u64..1000, 0..30)) {
        let stats: Vec<Stat> = totals
            .iter()
            .enumerate()
            .map(|(i, &total)| Stat {
                patient_id: i as u64,
                name: format!("P{i}"),
                total_appointments: total,
            })
            .collect();
        let view = aggregate(&stats);

        prop_assert_eq!(view.rows.len(), stats.len());
        for row in &view.rows {
            prop_assert!(row.scale_percent.is_finite());
            prop_assert!((0.0..=100.0).contains(&row.scale_percent));
            if view.max > 0 && row.total_appointments == view.max {
                prop_assert_eq!(row.severity, Severity::High);
            }
        }
    }

    #[test]
    fn huge_counts_saturate_the_total(totals in prop::collection::vec(any::<u64>(), 0..8)) {
        let stats: Vec<Stat> = totals
            .iter()
            .enumerate()
            .map(|(i, &total)| Stat {
                patient_id: i as u64,
                name: format!("P{i}"),
                total_appointments: total,
            })
            .collect();
        let view = aggregate(&stats);

        let expected = totals.iter().fold(0u64, |acc, &t| acc.saturating_add(t));
        prop_assert_eq!(view.total, expected);
        for row in &view.rows {
            prop_assert!((0.0..=100.0).contains(&row.scale_percent));
        }
    }
}
