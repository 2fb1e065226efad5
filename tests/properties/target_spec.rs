//! Property tests for `[user@]host[:port]` target specs.

use proptest::prelude::*;

use convoy::domain::value_objects::TargetDefaults;
use convoy::Target;

fn defaults() -> TargetDefaults {
    TargetDefaults {
        user: "deploy".to_string(),
        port: 22,
        identity_file: None,
    }
}

proptest! {
    /// PROPERTY: parsing arbitrary input never panics.
    #[test]
    fn property_parse_never_panics(spec in "\\PC{0,40}") {
        let _ = Target::parse(&spec, &defaults());
    }

    /// PROPERTY: a well-formed spec parses back to its parts.
    #[test]
    fn property_full_spec_round_trips(
        user in "[a-z][a-z0-9_-]{0,10}",
        host in "[a-z0-9][a-z0-9.-]{0,20}",
        port in 1u16..=u16::MAX,
    ) {
        let spec = format!("{}@{}:{}", user, host, port);
        let target = Target::parse(&spec, &defaults()).unwrap();
        prop_assert_eq!(&target.user, &user);
        prop_assert_eq!(&target.host, &host);
        prop_assert_eq!(target.port, port);
        prop_assert_eq!(target.to_string(), spec);
    }

    /// PROPERTY: missing parts come from the defaults.
    #[test]
    fn property_bare_host_uses_defaults(host in "[a-z0-9][a-z0-9.-]{0,20}") {
        let target = Target::parse(&host, &defaults()).unwrap();
        prop_assert_eq!(target.id(), format!("deploy@{}", host));
        prop_assert_eq!(target.port, 22);
    }

    /// PROPERTY: bracketed IPv6 hosts keep their colons and round-trip.
    #[test]
    fn property_ipv6_spec_round_trips(
        groups in proptest::collection::vec(0u16..=0xffff, 8),
        port in 1u16..=u16::MAX,
    ) {
        let addr: Vec<String> = groups.iter().map(|g| format!("{:x}", g)).collect();
        let host = addr.join(":");
        let spec = format!("ops@[{}]:{}", host, port);
        let target = Target::parse(&spec, &defaults()).unwrap();
        prop_assert_eq!(&target.host, &host);
        prop_assert_eq!(target.port, port);
        prop_assert_eq!(target.to_string(), spec);
    }
}
