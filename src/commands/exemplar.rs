use crate::core::{config::Settings, render::exemplar_text};

/// Print a sample status line using the configured icons
pub fn execute_exemplar(settings: &Settings) {
    println!("{}", exemplar_text(&settings.icons));
}
