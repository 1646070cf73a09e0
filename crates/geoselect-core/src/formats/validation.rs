//! Pre-read checks shared by the format readers

use crate::formats::FormatValidation;
use std::io::ErrorKind;
use std::path::Path;

impl FormatValidation {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append the findings of another check
    pub fn absorb(&mut self, other: FormatValidation) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// The source must be an existing regular file
pub fn check_source_file(path: &Path) -> FormatValidation {
    let mut validation = FormatValidation::default();

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => validation.error(format!("{} is not a regular file", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            validation.error(format!("{} does not exist", path.display()))
        }
        Err(e) => validation.error(format!("{} is not accessible: {}", path.display(), e)),
    }

    validation
}

/// Sidecar files next to `base`. Missing optional ones are warnings.
pub fn check_sidecars(base: &Path, required: &[&str], optional: &[&str]) -> FormatValidation {
    let mut validation = FormatValidation::default();
    let absent = |ext: &&&str| !base.with_extension(ext).is_file();

    for ext in required.iter().filter(absent) {
        validation.error(format!("missing sidecar {}", base.with_extension(ext).display()));
    }
    for ext in optional.iter().filter(absent) {
        validation.warn(format!(
            "no sidecar {}; the layer CRS will be undefined",
            base.with_extension(ext).display()
        ));
    }

    validation
}

/// A GeoJSON source must hold a JSON object with a string `type` member
pub fn check_geojson_document(path: &Path) -> FormatValidation {
    let mut validation = FormatValidation::default();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            validation.error(format!("cannot read {}: {}", path.display(), e));
            return validation;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(document) if document.get("type").is_some_and(|t| t.is_string()) => {}
        Ok(_) => validation.error("document has no GeoJSON \"type\" member"),
        Err(e) => validation.error(format!("invalid JSON: {}", e)),
    }

    validation
}
