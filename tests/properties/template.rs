//! Property tests for `{{ key }}` placeholder rendering.

use proptest::prelude::*;

use convoy::config::{resolve, ConfigValue};
use convoy::domain::services::render_template;

proptest! {
    /// PROPERTY: text without placeholders renders unchanged.
    #[test]
    fn property_plain_text_is_unchanged(text in "[^{}]{0,60}") {
        let config = resolve(&ConfigValue::empty_map()).unwrap();
        prop_assert_eq!(render_template(&text, config.as_value()).unwrap(), text);
    }

    /// PROPERTY: a placeholder renders to the configured string.
    #[test]
    fn property_placeholder_takes_config_value(
        branch in "[a-zA-Z0-9/_.-]{1,20}",
        prefix in "[a-z ]{0,10}",
    ) {
        let mut raw = ConfigValue::empty_map();
        raw.set_path("branch", ConfigValue::String(branch.clone()));
        let config = resolve(&raw).unwrap();

        let template = format!("{}{{{{ branch }}}}", prefix);
        let rendered = render_template(&template, config.as_value()).unwrap();
        prop_assert_eq!(rendered, format!("{}{}", prefix, branch));
    }

    /// PROPERTY: rendering arbitrary templates never panics.
    #[test]
    fn property_render_never_panics(template in "\\PC{0,60}") {
        let config = resolve(&ConfigValue::empty_map()).unwrap();
        let _ = render_template(&template, config.as_value());
    }
}
