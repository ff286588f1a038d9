//! Output formatting: human-readable or strict JSON, progress bars, tables

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ZipProgress;

use gsz_core::{ColorMode, Defaults, OutputFormat};

/// Output settings resolved from global flags and `[defaults]`
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub no_color: bool,
    pub quiet: bool,
    pub no_progress: bool,
}

impl OutputConfig {
    /// Flags win over the config file; `--json` implies no color and no
    /// progress so stdout stays machine readable
    pub fn resolve(defaults: &Defaults, json: bool, no_color: bool, quiet: bool) -> Self {
        let json = json || defaults.output == OutputFormat::Json;
        let no_color = json
            || no_color
            || match defaults.color {
                ColorMode::Never => true,
                ColorMode::Always => false,
                ColorMode::Auto => !console::colors_enabled(),
            };
        Self {
            json,
            no_color,
            quiet,
            no_progress: json || quiet || !defaults.progress,
        }
    }
}
