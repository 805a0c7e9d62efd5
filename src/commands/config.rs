use crate::core::{config::Settings, error::Result, output::print_success};

/// Print the effective settings as JSON, optionally writing them to the
/// settings file so they can be edited.
pub fn execute_config(settings: &Settings, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);

    if save {
        let path = settings.save()?;
        print_success(&format!("Settings saved to {}", path.display()));
    }
    Ok(())
}
