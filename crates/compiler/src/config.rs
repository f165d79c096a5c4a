//! Compiler configuration.
//!
//! An optional `n7.toml` next to the compiler executable can set the
//! library search paths and the default optimization switch:
//!
//! ```toml
//! lib_path = "/opt/n7/lib/"
//! user_lib_path = ""
//! optimize = true
//! ```
//!
//! Command line flags override anything set here. Library paths are plain
//! string prefixes concatenated to included filenames, so they normally
//! end with a path separator.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// System library path prefix.
    pub lib_path: Option<String>,
    /// User library path prefix; defaults to the source file's directory.
    pub user_lib_path: Option<String>,
    /// Default for peephole optimization (`--no-opt` still wins).
    pub optimize: Option<bool>,
}

impl Config {
    /// Load a configuration file. A missing file is an empty config;
    /// a malformed one is an error.
    pub fn load(path: &Path) -> Result<Config, String> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Ok(Config::default()),
        };
        toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn missing_file_is_empty_config() {
        let config = Config::load(Path::new("/nonexistent/n7.toml")).unwrap();
        assert!(config.lib_path.is_none());
        assert!(config.optimize.is_none());
    }

    #[test]
    fn parses_paths_and_switches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lib_path = \"/opt/n7/lib/\"\noptimize = false").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.lib_path.as_deref(), Some("/opt/n7/lib/"));
        assert_eq!(config.optimize, Some(false));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "libpath = \"typo\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
