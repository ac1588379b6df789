//! Property-Based Tests - Version and Migration Invariants
//!
//! Uses `proptest` to check version comparison and the default
//! migration outcome across random version pairs.

use proptest::prelude::*;
use serde_json::json;

use versioned_store::domain::{Envelope, VersionDelta, VersionTag};
use versioned_store::ports::migration::NoMigration;
use versioned_store::usecases::migration_engine::MigrationEngine;

fn version() -> impl Strategy<Value = VersionTag> {
    (1u32..6, 1u32..6).prop_map(|(major, minor)| VersionTag::new(major, minor))
}

// ── Version Comparison ──────────────────────────────────────

proptest! {
    /// Any major difference dominates the minor component.
    #[test]
    fn delta_classifies_by_major_first(declared in version(), persisted in version()) {
        let delta = declared.delta_from(&persisted);
        let expected = if declared.major != persisted.major {
            VersionDelta::MajorChanged
        } else if declared.minor != persisted.minor {
            VersionDelta::MinorChanged
        } else {
            VersionDelta::Same
        };
        prop_assert_eq!(delta, expected);
    }

    /// Comparison is symmetric in its classification.
    #[test]
    fn delta_is_symmetric(a in version(), b in version()) {
        prop_assert_eq!(a.delta_from(&b), b.delta_from(&a));
    }
}

// ── Default Migration Outcome ───────────────────────────────

proptest! {
    /// Without a hook, only a major change fails to load; everything else
    /// passes the data through untouched.
    #[test]
    fn no_migration_fails_only_on_major_change(
        declared in version(),
        persisted in version(),
        n in any::<i64>(),
    ) {
        let data = json!({"n": n});
        let outcome = tokio_test::block_on(
            MigrationEngine::new("prop", declared).run(persisted, data.clone(), &NoMigration),
        );

        if declared.major == persisted.major {
            let migrated = outcome.unwrap();
            prop_assert_eq!(migrated.data, data);
        } else {
            let err = outcome.unwrap_err();
            prop_assert!(err.is_schema_unsupported());
        }
    }

    /// Envelopes always carry the version they were created with.
    #[test]
    fn envelope_round_trips_its_version_through_json(tag in version(), key in "[a-z_]{1,16}") {
        let envelope = Envelope::new(&key, tag, json!(null));
        let text = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back.version_tag(), tag);
        prop_assert_eq!(back.key, key);
    }
}
