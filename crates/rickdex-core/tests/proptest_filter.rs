use proptest::prelude::*;
use rickdex_core::filter::{Predicate, apply};
use rickdex_core::model::{Gender, Place, Record, RecordId, Status};
use rickdex_core::sort::{SortDirection, SortField, SortKey, sort_records};

const SPECIES: [&str; 3] = ["Human", "Alien", "Robot"];
const LOCATIONS: [&str; 3] = ["Earth", "Citadel", "Purge Planet"];
const NAMES: [&str; 5] = ["Rick", "Morty", "Summer", "Beth", "Jerry"];

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Alive),
        Just(Status::Dead),
        Just(Status::Unknown)
    ]
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        1u32..10_000,
        0usize..NAMES.len(),
        arb_status(),
        0usize..SPECIES.len(),
        0usize..LOCATIONS.len(),
    )
        .prop_map(|(id, name, status, species, location)| Record {
            id: RecordId(id),
            name: format!("{} {id}", NAMES[name]),
            status,
            species: SPECIES[species].to_string(),
            subtype: String::new(),
            gender: Gender::Unknown,
            origin: Place::default(),
            last_known_location: Place {
                name: LOCATIONS[location].to_string(),
                reference: String::new(),
            },
            image_ref: String::new(),
            episode_refs: Vec::new(),
            url: String::new(),
            created_at: String::new(),
        })
}

fn arb_predicate() -> impl Strategy<Value = Predicate> {
    (
        prop::option::of(0usize..NAMES.len()),
        prop::option::of(arb_status()),
        prop::option::of(0usize..SPECIES.len()),
        prop::option::of(0usize..LOCATIONS.len()),
    )
        .prop_map(|(text, status, species, location)| Predicate {
            text: text.map(|i| NAMES[i].to_lowercase()).unwrap_or_default(),
            status,
            species: species.map(|i| SPECIES[i].to_string()),
            location: location.map(|i| LOCATIONS[i].to_string()),
        })
}

/// Unique ids so "order preserved" is checkable by position.
fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(arb_record(), 0..60).prop_map(|mut records| {
        for (i, record) in records.iter_mut().enumerate() {
            record.id = RecordId(u32::try_from(i).unwrap_or(u32::MAX) + 1);
        }
        records
    })
}

fn arb_sort_field() -> impl Strategy<Value = SortField> {
    prop_oneof![
        Just(SortField::Id),
        Just(SortField::Name),
        Just(SortField::Status),
        Just(SortField::Species),
        Just(SortField::Location),
    ]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn filtered_is_an_ordered_subsequence(records in arb_records(), predicate in arb_predicate()) {
        let filtered = apply(&records, &predicate);
        let mut cursor = records.iter();
        for kept in &filtered {
            prop_assert!(predicate.matches(kept));
            prop_assert!(cursor.any(|r| r == kept), "out of order or foreign record");
        }
        let expected = records.iter().filter(|r| predicate.matches(r)).count();
        prop_assert_eq!(filtered.len(), expected);
    }

    #[test]
    fn empty_predicate_is_identity(records in arb_records()) {
        prop_assert_eq!(apply(&records, &Predicate::all()), records);
    }

    #[test]
    fn criteria_combine_as_conjunction(records in arb_records(), status in arb_status(), species in 0usize..SPECIES.len()) {
        let by_status = apply(&records, &Predicate::all().with_status(status));
        let by_both_stepwise = apply(&by_status, &Predicate::all().with_species(SPECIES[species]));
        let by_both = apply(
            &records,
            &Predicate::all().with_status(status).with_species(SPECIES[species]),
        );
        prop_assert_eq!(by_both, by_both_stepwise);
    }

    #[test]
    fn text_match_ignores_case(records in arb_records(), name in 0usize..NAMES.len()) {
        let lower = apply(&records, &Predicate::all().with_text(NAMES[name].to_lowercase()));
        let upper = apply(&records, &Predicate::all().with_text(NAMES[name].to_uppercase()));
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn sort_is_an_ordered_permutation(mut records in arb_records(), field in arb_sort_field(), desc in any::<bool>()) {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let mut before: Vec<u32> = records.iter().map(|r| r.id.0).collect();
        sort_records(&mut records, SortKey { field, direction });

        let mut after: Vec<u32> = records.iter().map(|r| r.id.0).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);

        for pair in records.windows(2) {
            let ord = field.key(&pair[0]).cmp(&field.key(&pair[1]));
            match direction {
                SortDirection::Asc => prop_assert!(ord.is_le()),
                SortDirection::Desc => prop_assert!(ord.is_ge()),
            }
        }
    }
}
