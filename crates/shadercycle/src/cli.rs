use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "shadercycle",
    author,
    version,
    about = "Cycles shader programs over simple shapes (A/D or Left/Right to switch)"
)]
pub struct Cli {
    /// TOML file with window and shader settings.
    #[arg(long, value_name = "FILE", env = "SHADERCYCLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Shader description for the first view (triangle).
    #[arg(long, value_name = "FILE")]
    pub default_shader: Option<PathBuf>,

    /// Shader description for the second view (square).
    #[arg(long, value_name = "FILE")]
    pub rainbow_shader: Option<PathBuf>,

    /// Shader description for the third view (rectangle).
    #[arg(long, value_name = "FILE")]
    pub reflection_shader: Option<PathBuf>,

    /// Compile and link every program without opening a window, then exit.
    #[arg(long)]
    pub check: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 800x600".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }
    Ok((width, height))
}
