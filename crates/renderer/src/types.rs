use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> wgpu::naga::ShaderStage {
        match self {
            StageKind::Vertex => wgpu::naga::ShaderStage::Vertex,
            StageKind::Fragment => wgpu::naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// The fixed set of programs built at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramName {
    Default,
    Rainbow,
    Reflection,
}

impl ProgramName {
    /// Build order used at startup; teardown walks it in reverse.
    pub const ALL: [ProgramName; 3] = [
        ProgramName::Default,
        ProgramName::Rainbow,
        ProgramName::Reflection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProgramName::Default => "default",
            ProgramName::Rainbow => "rainbow",
            ProgramName::Reflection => "reflection",
        }
    }

    /// Shader description compiled into the crate for this program.
    pub fn embedded_source(self) -> &'static str {
        match self {
            ProgramName::Default => include_str!("../shaders/default.shader"),
            ProgramName::Rainbow => include_str!("../shaders/rainbow.shader"),
            ProgramName::Reflection => include_str!("../shaders/reflection.shader"),
        }
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive assembly requested by a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Every three vertices form an independent triangle.
    Triangles,
    /// Vertex 0 is shared by every triangle `(0, i, i + 1)`.
    TriangleFan,
}

/// Drawable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub(crate) fn screen_size(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Where a shader description is read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    /// Built-in description shipped with the renderer.
    #[default]
    Embedded,
    /// Description file on disk.
    File(PathBuf),
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderSource::Embedded => f.write_str("<embedded>"),
            ShaderSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Description locations for each named program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub default: ShaderSource,
    pub rainbow: ShaderSource,
    pub reflection: ShaderSource,
}

impl ShaderSources {
    pub fn get(&self, name: ProgramName) -> &ShaderSource {
        match name {
            ProgramName::Default => &self.default,
            ProgramName::Rainbow => &self.rainbow,
            ProgramName::Reflection => &self.reflection,
        }
    }

    pub fn set(&mut self, name: ProgramName, source: ShaderSource) {
        match name {
            ProgramName::Default => self.default = source,
            ProgramName::Rainbow => self.rainbow = source,
            ProgramName::Reflection => self.reflection = source,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    pub sources: ShaderSources,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            title: "Prototype".to_string(),
            sources: ShaderSources::default(),
        }
    }
}
