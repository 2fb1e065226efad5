//! Built-in deployment presets
//!
//! A preset is a fixed, ordered list of step templates. Text fields may
//! contain `{{ dotted.key }}` placeholders, filled in from the resolved
//! configuration by [`render_steps`]. A `{{ key | quote }}` placeholder is
//! rendered as a single shell word; plain placeholders are spliced verbatim,
//! which is what command-valued keys such as `scripts.build` need. Preset
//! names are public contract: rename one and existing configs break.

use std::sync::LazyLock;

use crate::config::ConfigValue;
use crate::domain::entities::Step;
use crate::error::{ConvoyError, ConvoyResult};

/// A named step template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub steps: Vec<Step>,
}

const CLONE_IF_MISSING: &str = "test -d {{ deployment.base_dir | quote }}/.git \
     || git clone {{ repository_url | quote }} {{ deployment.base_dir | quote }}";
const CHECKOUT_BRANCH: &str = "cd {{ deployment.base_dir | quote }} \
     && git fetch --all --prune \
     && git checkout {{ branch | quote }} \
     && git pull --ff-only origin {{ branch | quote }}";
const RELOAD: &str = "cd {{ deployment.base_dir | quote }} && {{ scripts.reload }}";

static PRESETS: LazyLock<Vec<Preset>> = LazyLock::new(|| {
    vec![
        Preset {
            name: "web",
            description: "Upload a prebuilt archive and unpack it into <base_dir>/current",
            steps: vec![
                Step::run("mkdir -p {{ deployment.base_dir | quote }}/current"),
                Step::put(
                    "{{ deployment.archive }}",
                    "{{ deployment.base_dir }}/build.tar.gz",
                    true,
                ),
                Step::run(
                    "tar -xzf {{ deployment.base_dir | quote }}/build.tar.gz \
                     -C {{ deployment.base_dir | quote }}/current",
                ),
                Step::run("rm -f {{ deployment.base_dir | quote }}/build.tar.gz"),
                Step::write(
                    "{{ deployment.base_dir }}/REVISION",
                    "{{ project_name }}@{{ branch }}\n",
                ),
            ],
        },
        Preset {
            name: "node",
            description: "Check out the branch on the host, install, build and reload",
            steps: vec![
                Step::run(CLONE_IF_MISSING),
                Step::run(CHECKOUT_BRANCH),
                Step::run("cd {{ deployment.base_dir | quote }} && {{ scripts.install }}"),
                Step::run("cd {{ deployment.base_dir | quote }} && {{ scripts.build }}"),
                Step::run(RELOAD),
            ],
        },
        Preset {
            name: "remote-source",
            description: "Check out the branch on the host and reload",
            steps: vec![
                Step::run(CLONE_IF_MISSING),
                Step::run(CHECKOUT_BRANCH),
                Step::run(RELOAD),
            ],
        },
    ]
});

/// All built-in presets, in a stable order
pub fn list_presets() -> &'static [Preset] {
    &PRESETS
}

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Step templates for `name`, unrendered
pub fn expand_preset(name: &str) -> ConvoyResult<Vec<Step>> {
    find_preset(name)
        .map(|preset| preset.steps.clone())
        .ok_or_else(|| ConvoyError::UnknownPreset {
            name: name.to_string(),
            available: PRESETS
                .iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Fill placeholders in every step from `config`
pub fn render_steps(steps: &[Step], config: &ConfigValue) -> ConvoyResult<Vec<Step>> {
    steps
        .iter()
        .map(|step| step.try_map_text(|text| render_template(text, config)))
        .collect()
}

/// Replace each `{{ key }}` in `template` with the scalar at `key`.
///
/// Single braces (shell `${VAR}`) are left alone.
pub fn render_template(template: &str, config: &ConfigValue) -> ConvoyResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open.find("}}").ok_or_else(|| {
            ConvoyError::invalid_config("template", format!("unclosed '{{{{' in \"{}\"", template))
        })?;
        let placeholder = &after_open[..end];
        let (key, quote) = match placeholder.split_once('|') {
            Some((key, filter)) if filter.trim() == "quote" => (key.trim(), true),
            Some(_) => return Err(bad_placeholder(placeholder, template)),
            None => (placeholder.trim(), false),
        };
        if key.is_empty() || !key.chars().all(is_key_char) {
            return Err(bad_placeholder(placeholder, template));
        }

        match config.get_path(key) {
            Some(value) if value.is_scalar() => {
                let text = value.to_string();
                if quote {
                    out.push_str(&shell_word(&text));
                } else {
                    out.push_str(&text);
                }
            }
            Some(value) => {
                return Err(ConvoyError::invalid_config(
                    key,
                    format!("placeholder needs a scalar, found {}", value.type_name()),
                ))
            }
            None => {
                return Err(ConvoyError::invalid_config(
                    key,
                    "placeholder refers to a key that is not set",
                ))
            }
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

fn bad_placeholder(placeholder: &str, template: &str) -> ConvoyError {
    ConvoyError::invalid_config(
        "template",
        format!("bad placeholder '{{{{{}}}}}' in \"{}\"", placeholder, template),
    )
}

/// `value` as one shell word, quoted only when it has to be.
///
/// A leading `~/` stays outside the quotes so the remote shell still expands it.
pub fn shell_word(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    match value.strip_prefix("~/") {
        Some(rest) if !rest.is_empty() => format!("~/{}", shell_word(rest)),
        _ => format!("'{}'", value.replace('\'', "'\\''")),
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',' | '~')
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}
