#![no_main]

use convoy::config::{default_config, ConfigValue};
use convoy::domain::services::render_template;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(template) = std::str::from_utf8(data) {
        let _ = render_template(template, default_config());
        let _ = render_template(template, &ConfigValue::empty_map());
    }
});
