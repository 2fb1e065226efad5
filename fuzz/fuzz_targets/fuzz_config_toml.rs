#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Parsing and resolving arbitrary config documents should never panic
        if let Ok(raw) = convoy::config::parse_document(content, Path::new("convoy.toml")) {
            if let Ok(config) = convoy::resolve(&raw) {
                let _ = config.targets();
            }
        }
    }
});
