//! Property-based tests for version parsing and state serialization.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use edge_cli::domain::state::{ExperimentsState, ModelState, StorageState};
use edge_cli::domain::{EdgeState, Version};

proptest! {
    /// Rendered versions parse back, with or without `v` prefix and build metadata.
    #[test]
    fn prop_version_parses_its_own_rendering(
        major in 0u64..10_000,
        minor in 0u64..100,
        patch in 0u64..100,
        prefixed in any::<bool>(),
        build in proptest::option::of("[a-z0-9]{1,8}"),
    ) {
        let version = Version::new(major, minor, patch);
        let mut raw = version.to_string();
        if prefixed {
            raw.insert(0, 'v');
        }
        if let Some(build) = build {
            raw.push('+');
            raw.push_str(&build);
        }
        prop_assert_eq!(Version::parse(&raw).unwrap(), version);
    }

    /// `is_at_least` agrees with lexicographic ordering of the components.
    #[test]
    fn prop_is_at_least_is_lexicographic(
        a in (0u64..50, 0u64..50, 0u64..50),
        b in (0u64..50, 0u64..50, 0u64..50),
    ) {
        let left = Version::new(a.0, a.1, a.2);
        let right = Version::new(b.0, b.1, b.2);
        prop_assert_eq!(left.is_at_least(right), a >= b);
    }

    /// Anything that is not three numbers is rejected.
    #[test]
    fn prop_two_component_versions_are_rejected(major in 0u64..100, minor in 0u64..100) {
        let raw = format!("{major}.{minor}");
        prop_assert!(Version::parse(&raw).is_err());
    }

    /// A saved state document loads back equal.
    #[test]
    fn prop_state_survives_serialization(
        models in proptest::collection::btree_map(
            "[a-z][a-z0-9-]{0,10}",
            ("[1-9][0-9]{0,5}", proptest::option::of("[1-9][0-9]{0,5}")),
            0..4,
        ),
        dashboard in proptest::option::of("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"),
        bucket in proptest::option::of("[a-z][a-z0-9-]{2,20}"),
    ) {
        let state = EdgeState {
            models: models
                .into_iter()
                .map(|(name, (endpoint, deployed))| {
                    (
                        name,
                        ModelState {
                            endpoint_resource_name: format!("projects/1/endpoints/{endpoint}"),
                            deployed_model_id: deployed,
                        },
                    )
                })
                .collect(),
            experiments: dashboard.map(|ip| ExperimentsState {
                dashboard_url: format!("http://{ip}:9000"),
            }),
            storage: bucket.map(|b| StorageState {
                bucket_path: format!("gs://{b}/"),
            }),
        };
        let back = EdgeState::from_bytes(&state.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(back, state);
    }
}
