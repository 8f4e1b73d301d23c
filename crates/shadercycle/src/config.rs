use std::fs;
use std::path::{Path, PathBuf};

use renderer::{ProgramName, RendererConfig, ShaderSource};
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub shaders: ShaderSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WindowSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ShaderSection {
    pub default: Option<PathBuf>,
    pub rainbow: Option<PathBuf>,
    pub reflection: Option<PathBuf>,
}

impl ShaderSection {
    fn get(&self, name: ProgramName) -> Option<&PathBuf> {
        match name {
            ProgramName::Default => self.default.as_ref(),
            ProgramName::Rainbow => self.rainbow.as_ref(),
            ProgramName::Reflection => self.reflection.as_ref(),
        }
    }
}

impl FileConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FileConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads `path` and resolves relative shader paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == Some(0) || self.window.height == Some(0) {
            return Err(ConfigError::Invalid(
                "window dimensions must be greater than zero".to_string(),
            ));
        }
        if let Some(title) = &self.window.title {
            if title.trim().is_empty() {
                return Err(ConfigError::Invalid("window title must not be empty".to_string()));
            }
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.shaders.default,
            &mut self.shaders.rainbow,
            &mut self.shaders.reflection,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Layers CLI flags over the optional config file and the built-in defaults.
pub fn resolve(cli: &Cli, file: Option<FileConfig>) -> RendererConfig {
    let file = file.unwrap_or_default();
    let mut config = RendererConfig::default();

    let (default_width, default_height) = config.surface_size;
    config.surface_size = cli.size.unwrap_or((
        file.window.width.unwrap_or(default_width),
        file.window.height.unwrap_or(default_height),
    ));
    if let Some(title) = cli.title.clone().or(file.window.title) {
        config.title = title;
    }

    for name in ProgramName::ALL {
        let flag = match name {
            ProgramName::Default => cli.default_shader.as_ref(),
            ProgramName::Rainbow => cli.rainbow_shader.as_ref(),
            ProgramName::Reflection => cli.reflection_shader.as_ref(),
        };
        if let Some(path) = flag.or_else(|| file.shaders.get(name)) {
            config.sources.set(name, ShaderSource::File(path.clone()));
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[window]
width = 1024
height = 768
title = "Shapes"

[shaders]
rainbow = "shaders/rainbow.shader"
reflection = "/opt/shaders/reflection.shader"
"#;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["shadercycle"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_sample() {
        let config = FileConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.window.width, Some(1024));
        assert_eq!(config.window.title.as_deref(), Some("Shapes"));
        assert!(config.shaders.default.is_none());
    }

    #[test]
    fn empty_file_is_valid() {
        assert_eq!(FileConfig::from_toml_str("").unwrap(), FileConfig::default());
    }

    #[test]
    fn rejects_unknown_keys_and_zero_size() {
        assert!(matches!(
            FileConfig::from_toml_str("[window]\ndepth = 3\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FileConfig::from_toml_str("[window]\nwidth = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_resolves_relative_paths_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shadercycle.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(
            config.shaders.rainbow,
            Some(dir.path().join("shaders/rainbow.shader"))
        );
        assert_eq!(
            config.shaders.reflection,
            Some(PathBuf::from("/opt/shaders/reflection.shader"))
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FileConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = resolve(&cli(&[]), None);
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.title, "Prototype");
        assert_eq!(config.sources, renderer::ShaderSources::default());
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::from_toml_str(SAMPLE).unwrap();
        let config = resolve(
            &cli(&["--size", "640x480", "--rainbow-shader", "mine.shader"]),
            Some(file),
        );
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.title, "Shapes");
        assert_eq!(config.sources.default, ShaderSource::Embedded);
        assert_eq!(
            config.sources.rainbow,
            ShaderSource::File(PathBuf::from("mine.shader"))
        );
        assert_eq!(
            config.sources.reflection,
            ShaderSource::File(PathBuf::from("/opt/shaders/reflection.shader"))
        );
    }

    #[test]
    fn partial_window_section_keeps_default_height() {
        let file = FileConfig::from_toml_str("[window]\nwidth = 1000\n").unwrap();
        let config = resolve(&cli(&[]), Some(file));
        assert_eq!(config.surface_size, (1000, 600));
    }
}
