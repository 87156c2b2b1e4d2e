//! Process configuration: template locations and the output base directory

use std::env;
use std::path::PathBuf;

/// Environment variables that override the built-in defaults.
pub const ENV_TEMPLATE_CHAR_SOLID: &str = "LABBOOK_TEMPLATE_CHAR_SOLID";
pub const ENV_TEMPLATE_CHAR_EFFLUENT: &str = "LABBOOK_TEMPLATE_CHAR_EFFLUENT";
pub const ENV_TEMPLATE_BMP_SOLID: &str = "LABBOOK_TEMPLATE_BMP_SOLID";
pub const ENV_TEMPLATE_BMP_EFFLUENT: &str = "LABBOOK_TEMPLATE_BMP_EFFLUENT";
pub const ENV_BASE_DIR: &str = "LABBOOK_BASE_DIR";

/// Resolved process configuration. Built once at startup from the
/// environment; missing variables fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub template_char_solid: PathBuf,
    pub template_char_effluent: PathBuf,
    pub template_bmp_solid: PathBuf,
    pub template_bmp_effluent: PathBuf,
    /// Project folders are created under this directory.
    pub base_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_char_solid: PathBuf::from(
                "templates/Master_template_solid_characterisation.xlsx",
            ),
            template_char_effluent: PathBuf::from(
                "templates/Master_template_effluent_characterisation.xlsx",
            ),
            template_bmp_solid: PathBuf::from("templates/Master_template_BMP_solid.xlsx"),
            template_bmp_effluent: PathBuf::from("templates/Master_template_BMP_effluent.xlsx"),
            base_dir: PathBuf::from("projects"),
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults for
    /// any unset variable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            template_char_solid: env_path(ENV_TEMPLATE_CHAR_SOLID, defaults.template_char_solid),
            template_char_effluent: env_path(
                ENV_TEMPLATE_CHAR_EFFLUENT,
                defaults.template_char_effluent,
            ),
            template_bmp_solid: env_path(ENV_TEMPLATE_BMP_SOLID, defaults.template_bmp_solid),
            template_bmp_effluent: env_path(
                ENV_TEMPLATE_BMP_EFFLUENT,
                defaults.template_bmp_effluent,
            ),
            base_dir: env_path(ENV_BASE_DIR, defaults.base_dir),
        }
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    match env::var(key) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => default,
    }
}
