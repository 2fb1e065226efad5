#![no_main]

use convoy::domain::value_objects::TargetDefaults;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(spec) = std::str::from_utf8(data) {
        let defaults = TargetDefaults {
            user: "deploy".to_string(),
            port: 22,
            identity_file: None,
        };
        if let Ok(target) = convoy::Target::parse(spec, &defaults) {
            assert!(!target.host.is_empty());
            assert!(target.port != 0);
        }
    }
});
