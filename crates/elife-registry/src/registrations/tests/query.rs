use super::common::*;

use crate::registrations::domain::{Registration, RegistrationStatus};
use crate::registrations::query::{
    filter_registrations, Facets, RegistrationFilter, RegistrationSnapshot,
};
use crate::validation::ValidationError;

fn base_collection() -> Vec<Registration> {
    // Already newest first, as a snapshot would hold it.
    vec![
        registration("reg-000005", "FarmeLife", "Kadavoor", RegistrationStatus::Approved, 50),
        registration("reg-000004", "FoodeLife", "Piravom", RegistrationStatus::Pending, 40),
        registration("reg-000003", "FarmeLife", "Piravom", RegistrationStatus::Rejected, 30),
        registration("reg-000002", "Job Card", "Kadavoor", RegistrationStatus::Approved, 20),
        registration("reg-000001", "FarmeLife", "Kadavoor", RegistrationStatus::Pending, 10),
    ]
}

fn ids(records: &[Registration]) -> Vec<&str> {
    records.iter().map(|record| record.id.0.as_str()).collect()
}

#[test]
fn empty_filter_returns_the_collection_unchanged() {
    let records = base_collection();
    assert!(RegistrationFilter::all().is_empty());
    assert_eq!(filter_registrations(&records, &RegistrationFilter::all()), records);
}

#[test]
fn status_filter_keeps_relative_order() {
    let records = base_collection();
    let approved = filter_registrations(
        &records,
        &RegistrationFilter::all().with_status(RegistrationStatus::Approved),
    );
    assert_eq!(ids(&approved), vec!["reg-000005", "reg-000002"]);
}

#[test]
fn criteria_combine_with_and() {
    let records = base_collection();
    let filter = RegistrationFilter::all()
        .with_category("FarmeLife")
        .with_panchayath("Kadavoor");

    let matched = filter_registrations(&records, &filter);
    assert_eq!(ids(&matched), vec!["reg-000005", "reg-000001"]);
}

#[test]
fn filtering_is_idempotent() {
    let records = base_collection();
    let filter = RegistrationFilter::all().with_category("FarmeLife");

    let once = filter_registrations(&records, &filter);
    let twice = filter_registrations(&once, &filter);
    assert_eq!(once, twice);
}

#[test]
fn category_matching_is_exact() {
    let records = base_collection();
    let matched = filter_registrations(&records, &RegistrationFilter::all().with_category("farmelife"));
    assert!(matched.is_empty());
}

#[test]
fn form_params_treat_blank_as_any_and_parse_status() {
    let filter = RegistrationFilter::from_params(
        Some(String::new()),
        Some("Kadavoor".to_string()),
        Some("Approved".to_string()),
    )
    .expect("valid params");

    assert_eq!(filter.category, None);
    assert_eq!(filter.panchayath.as_deref(), Some("Kadavoor"));
    assert_eq!(filter.status, Some(RegistrationStatus::Approved));

    assert_eq!(
        RegistrationFilter::from_params(None, None, Some("archived".to_string())),
        Err(ValidationError::InvalidStatus("archived".to_string()))
    );
}

#[test]
fn facets_come_from_the_unfiltered_collection_in_first_seen_order() {
    let mut shuffled = base_collection();
    shuffled.reverse();
    let snapshot = RegistrationSnapshot::new(shuffled, opened_at());

    let facets = snapshot.facets();
    assert_eq!(
        facets,
        Facets {
            categories: vec![
                "FarmeLife".to_string(),
                "FoodeLife".to_string(),
                "Job Card".to_string()
            ],
            panchayaths: vec!["Kadavoor".to_string(), "Piravom".to_string()],
        }
    );

    let narrowed = snapshot.filter(&RegistrationFilter::all().with_category("Job Card"));
    assert_eq!(narrowed.len(), 1);
    assert_eq!(snapshot.facets(), facets);
}

#[test]
fn snapshot_orders_newest_first() {
    let mut shuffled = base_collection();
    shuffled.swap(0, 4);
    shuffled.swap(1, 2);

    let snapshot = RegistrationSnapshot::new(shuffled, opened_at());
    assert_eq!(
        ids(snapshot.records()),
        vec!["reg-000005", "reg-000004", "reg-000003", "reg-000002", "reg-000001"]
    );
    assert_eq!(snapshot.taken_at(), opened_at());

    let stats = snapshot.stats();
    assert_eq!((stats.total, stats.pending, stats.approved, stats.rejected), (5, 2, 2, 1));
}
