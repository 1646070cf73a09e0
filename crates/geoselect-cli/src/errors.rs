use console::style;
use geoselect_core::GeoselectError;
use std::fmt;

use crate::output::OutputWriter;

/// Error presentation with remediation suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<&GeoselectError> for CliError {
    fn from(error: &GeoselectError) -> Self {
        match error {
            GeoselectError::Load { path, reason } => CliError::new("Cannot load layer")
                .with_context(format!("Path: {}\nReason: {}", path.display(), reason))
                .with_suggestion("Check the path; directories must hold a single layer or use --layer-name")
                .with_suggestion("Supported inputs: GeoJSON (.geojson, .json) and Shapefile (.shp with .shx and .dbf)")
                .with_help("Run: geoselect inspect --help"),
            GeoselectError::UnsupportedFormat { extension, supported } => {
                CliError::new(format!("Unsupported format '{}'", extension))
                    .with_context(format!("Supported extensions: {}", supported.join(", ")))
                    .with_suggestion("Convert the layer to GeoJSON or Shapefile first")
            }
            GeoselectError::CrsMismatch { source_crs, target_crs, reason } => {
                CliError::new("CRS mismatch")
                    .with_context(format!("{} -> {}\n\n{}", source_crs, target_crs, reason))
                    .with_suggestion("Check the layers' CRS: geoselect inspect <layer>")
                    .with_suggestion("Reproject into a projected CRS: geoselect reproject <layer> --to EPSG:32618 -o out.geojson")
                    .with_suggestion("Or select in a projected frame: geoselect select ... --working-crs EPSG:32618")
            }
            GeoselectError::InvalidParameter { name, value, reason } => {
                CliError::new(format!("Invalid value for {}", name))
                    .with_context(format!("Got: {}\nExpected: {}", value, reason))
                    .with_help("Run: geoselect --help")
            }
            GeoselectError::FileExists { path } => CliError::new("Output file already exists")
                .with_context(format!("Path: {}", path.display()))
                .with_suggestion("Pass --overwrite to replace it")
                .with_suggestion("Or set overwrite = true in the config file / GEOSELECT_OVERWRITE=true"),
            GeoselectError::ConfigInvalid { key, reason } => {
                CliError::new(format!("Invalid configuration for {}", key))
                    .with_context(reason.clone())
                    .with_help("Run: geoselect config")
            }
            other => CliError::new(other.to_string()),
        }
    }
}

/// Print a failed command's error to stderr
pub fn report(error: &anyhow::Error, output: &OutputWriter) {
    if output.is_json() {
        output.error(format!("{:#}", error));
        return;
    }

    match error.chain().find_map(|cause| cause.downcast_ref::<GeoselectError>()) {
        Some(domain) => {
            let cli_error = CliError::from(domain);
            let cli_error = if error.to_string() != domain.to_string() {
                let context = cli_error.context.clone().unwrap_or_default();
                cli_error.with_context(format!("{}\n{}", error, context))
            } else {
                cli_error
            };
            cli_error.display();
        }
        None => output.error(format!("{:#}", error)),
    }
}
