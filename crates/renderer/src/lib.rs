//! Renderer crate for shadercycle.
//!
//! Three shader programs are built once at startup and one of three views is
//! drawn per frame:
//!
//! ```text
//!   description ──split──▶ vertex / fragment text
//!                               │ compile_stage (per stage)
//!                               ▼
//!                          link_program ──▶ ShaderProgram ──┐
//!                                                           │ ProgramSet
//!   key press ──▶ ViewState::apply ──▶ render_selected ◀────┘
//! ```
//!
//! Everything above the graphics API goes through the [`ShaderBackend`] and
//! [`GraphicsContext`] traits. [`WgpuContext`] is the real implementation;
//! [`OfflineBackend`] runs the same compile and link steps through naga alone
//! for `--check`.

mod backend;
mod compile;
mod error;
mod frame;
mod gpu;
mod link;
mod offline;
mod reflect;
mod source;
mod types;
mod view;
mod window;

#[cfg(test)]
mod testing;

pub use backend::{GraphicsContext, ShaderBackend};
pub use compile::{compile_stage, CompiledStage};
pub use error::PipelineError;
pub use frame::{
    initial_view_state, render, render_selected, view_at, Geometry, UniformBinding, View,
    OBJECT_COLOR, RECTANGLE, SQUARE, TRIANGLE, VIEWS,
};
pub use gpu::{VertexBuffer, WgpuContext, WgpuProgram, WgpuShader};
pub use link::{build_program, link_program, ProgramSet, ShaderProgram};
pub use offline::{check_sources, OfflineBackend, OfflineProgram, OfflineShader};
pub use reflect::{LinkedUniforms, UniformBlock, UniformKind, UniformMember, UniformSlot};
pub use source::{load, load_split, split, SplitError, SplitSource};
pub use types::{
    ProgramName, RendererConfig, ShaderSource, ShaderSources, StageKind, Topology, Viewport,
};
pub use view::{ViewCommand, ViewState};
pub use window::{command_for_key, Renderer};
