//! Property tests for raw config merging and resolution.

use std::collections::BTreeMap;

use proptest::prelude::*;

use convoy::config::{merge_raw, resolve, ConfigValue};

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("port".to_string()),
        Just("user".to_string()),
        Just("deployment".to_string()),
        Just("preset".to_string()),
        Just("timeouts".to_string()),
        "[a-z_]{1,8}",
    ]
}

fn scalar() -> impl Strategy<Value = ConfigValue> {
    prop_oneof![
        any::<bool>().prop_map(ConfigValue::Bool),
        any::<i64>().prop_map(ConfigValue::Integer),
        (-1.0e6f64..1.0e6).prop_map(ConfigValue::Float),
        "[ -~]{0,12}".prop_map(ConfigValue::String),
    ]
}

fn value() -> impl Strategy<Value = ConfigValue> {
    scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ConfigValue::List),
            prop::collection::btree_map(key(), inner, 0..4)
                .prop_map(|m| ConfigValue::Map(m.into_iter().collect())),
        ]
    })
}

fn map() -> impl Strategy<Value = ConfigValue> {
    prop::collection::btree_map(key(), value(), 0..5)
        .prop_map(|m: BTreeMap<String, ConfigValue>| ConfigValue::Map(m.into_iter().collect()))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: merging over an empty layer yields the overlay.
    #[test]
    fn property_empty_base_is_identity(x in value()) {
        prop_assert_eq!(merge_raw(&ConfigValue::empty_map(), &x), x);
    }

    /// PROPERTY: an empty overlay leaves a map untouched.
    #[test]
    fn property_empty_overlay_is_identity(x in map()) {
        prop_assert_eq!(merge_raw(&x, &ConfigValue::empty_map()), x);
    }

    /// PROPERTY: merging a layer with itself changes nothing.
    #[test]
    fn property_merge_is_idempotent(x in value()) {
        prop_assert_eq!(merge_raw(&x, &x), x);
    }

    /// PROPERTY: a scalar in the overlay always wins.
    #[test]
    fn property_overlay_scalar_wins(base in map(), k in key(), v in scalar()) {
        let mut overlay = ConfigValue::empty_map();
        overlay.set_path(&k, v.clone());
        let merged = merge_raw(&base, &overlay);
        prop_assert_eq!(merged.get_path(&k), Some(&v));
    }

    /// PROPERTY: resolution never panics and is deterministic.
    #[test]
    fn property_resolve_is_total_and_deterministic(raw in value()) {
        let first = resolve(&raw);
        let second = resolve(&raw);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "resolve gave different verdicts for the same input"),
        }
    }

    /// PROPERTY: a successful resolution keeps every default key.
    #[test]
    fn property_resolved_config_has_defaults(raw in map()) {
        if let Ok(config) = resolve(&raw) {
            prop_assert!(config.get("deployment.preset").is_some());
            prop_assert!(config.get("timeouts.command").is_some());
            prop_assert!(config.port() >= 1);
        }
    }
}
