//! Domain Services
//!
//! Stateless logic over domain types.

pub mod presets;

pub use presets::{
    expand_preset, find_preset, list_presets, render_steps, render_template, shell_word, Preset,
};
