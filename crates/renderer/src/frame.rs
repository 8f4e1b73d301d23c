//! Per-view geometry, uniform tables, and the per-frame draw.

use std::num::NonZeroUsize;

use crate::backend::GraphicsContext;
use crate::link::{ProgramSet, ShaderProgram};
use crate::types::{ProgramName, Topology, Viewport};
use crate::view::ViewState;

/// Fixed vertex list drawn by one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub vertices: &'static [[f32; 2]],
    pub topology: Topology,
}

impl Geometry {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

pub const TRIANGLE: Geometry = Geometry {
    vertices: &[[-0.5, -0.5], [0.0, 0.5], [0.5, -0.5]],
    topology: Topology::Triangles,
};

pub const SQUARE: Geometry = Geometry {
    vertices: &[[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]],
    topology: Topology::TriangleFan,
};

pub const RECTANGLE: Geometry = Geometry {
    vertices: &[[-0.7, -0.4], [0.7, -0.4], [0.7, 0.4], [-0.7, 0.4]],
    topology: Topology::TriangleFan,
};

pub const OBJECT_COLOR: [f32; 4] = [0.5, 1.0, 1.0, 1.0];

/// Uniform a view writes before drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformBinding {
    /// `vec2 screenSize`, the viewport in pixels.
    ScreenSize,
    /// `vec4 objectColor`.
    ObjectColor([f32; 4]),
}

impl UniformBinding {
    pub fn name(&self) -> &'static str {
        match self {
            UniformBinding::ScreenSize => "screenSize",
            UniformBinding::ObjectColor(_) => "objectColor",
        }
    }
}

/// Program, geometry and uniform set drawn for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub label: &'static str,
    pub program: ProgramName,
    pub geometry: Geometry,
    pub uniforms: &'static [UniformBinding],
}

pub const VIEWS: [View; 3] = [
    View {
        label: "triangle",
        program: ProgramName::Default,
        geometry: TRIANGLE,
        uniforms: &[],
    },
    View {
        label: "square",
        program: ProgramName::Rainbow,
        geometry: SQUARE,
        uniforms: &[UniformBinding::ScreenSize],
    },
    View {
        label: "rectangle",
        program: ProgramName::Reflection,
        geometry: RECTANGLE,
        uniforms: &[
            UniformBinding::ScreenSize,
            UniformBinding::ObjectColor(OBJECT_COLOR),
        ],
    },
];

/// A fresh selection over [`VIEWS`].
pub fn initial_view_state() -> ViewState {
    ViewState::new(NonZeroUsize::new(VIEWS.len()).unwrap_or(NonZeroUsize::MIN))
}

/// The view at `index`, wrapping into range.
pub fn view_at(index: usize) -> &'static View {
    &VIEWS[index % VIEWS.len()]
}

/// Binds `program`, replaces the vertex buffer with the view's geometry,
/// writes the view's uniforms and issues a single draw.
///
/// A uniform the program does not expose is skipped.
pub fn render<G: GraphicsContext>(
    ctx: &mut G,
    view: &View,
    program: &ShaderProgram<G::Program>,
    buffer: &G::Buffer,
    viewport: Viewport,
) {
    ctx.use_program(program.handle());
    ctx.upload_vertices(buffer, view.geometry.vertices);

    for binding in view.uniforms {
        let Some(location) = ctx.uniform_location(program.handle(), binding.name()) else {
            if cfg!(debug_assertions) {
                tracing::debug!(
                    program = %program.name(),
                    uniform = binding.name(),
                    "uniform not found; skipping"
                );
            }
            continue;
        };
        match binding {
            UniformBinding::ScreenSize => ctx.set_uniform_vec2(&location, viewport.screen_size()),
            UniformBinding::ObjectColor(color) => ctx.set_uniform_vec4(&location, *color),
        }
    }

    ctx.draw_arrays(view.geometry.topology, view.geometry.vertex_count());
}

/// Draws whichever view `state` currently selects.
pub fn render_selected<G: GraphicsContext>(
    ctx: &mut G,
    state: &ViewState,
    programs: &ProgramSet<G::Program>,
    buffer: &G::Buffer,
    viewport: Viewport,
) {
    let view = view_at(state.current());
    render(ctx, view, programs.get(view.program), buffer, viewport);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingContext};
    use crate::types::ShaderSources;
    use crate::view::ViewCommand;

    fn setup() -> (RecordingContext, ProgramSet<crate::testing::FakeProgram>) {
        let mut ctx = RecordingContext::default();
        let programs = ProgramSet::build(&mut ctx, &ShaderSources::default()).unwrap();
        ctx.calls.clear();
        (ctx, programs)
    }

    #[test]
    fn first_view_draws_triangle_without_uniforms() {
        let (mut ctx, programs) = setup();
        let state = initial_view_state();
        render_selected(&mut ctx, &state, &programs, &crate::testing::FakeBuffer, Viewport::new(800, 600));

        assert_eq!(
            ctx.calls,
            vec![
                Call::UseProgram("default".into()),
                Call::UploadVertices(TRIANGLE.vertices.to_vec()),
                Call::DrawArrays(Topology::Triangles, 3),
            ]
        );
    }

    #[test]
    fn second_view_sets_screen_size() {
        let (mut ctx, programs) = setup();
        let mut state = initial_view_state();
        state.apply(ViewCommand::Advance);
        render_selected(&mut ctx, &state, &programs, &crate::testing::FakeBuffer, Viewport::new(1024, 768));

        assert_eq!(
            ctx.calls,
            vec![
                Call::UseProgram("rainbow".into()),
                Call::UploadVertices(SQUARE.vertices.to_vec()),
                Call::SetUniformVec2("screenSize".into(), [1024.0, 768.0]),
                Call::DrawArrays(Topology::TriangleFan, 4),
            ]
        );
    }

    #[test]
    fn third_view_sets_both_uniforms_before_one_fan_draw() {
        let (mut ctx, programs) = setup();
        let mut state = initial_view_state();
        state.apply(ViewCommand::Retreat);
        assert_eq!(state.current(), 2);
        render_selected(&mut ctx, &state, &programs, &crate::testing::FakeBuffer, Viewport::new(800, 600));

        assert_eq!(ctx.draw_calls(), vec![&Call::DrawArrays(Topology::TriangleFan, 4)]);
        let draw_at = ctx.calls.len() - 1;
        let size_at = ctx
            .calls
            .iter()
            .position(|call| *call == Call::SetUniformVec2("screenSize".into(), [800.0, 600.0]))
            .expect("screenSize written");
        let color_at = ctx
            .calls
            .iter()
            .position(|call| *call == Call::SetUniformVec4("objectColor".into(), OBJECT_COLOR))
            .expect("objectColor written");
        assert!(size_at < draw_at && color_at < draw_at);
        assert_eq!(ctx.calls[0], Call::UseProgram("reflection".into()));
        assert_eq!(ctx.calls[1], Call::UploadVertices(RECTANGLE.vertices.to_vec()));
    }

    #[test]
    fn missing_uniform_is_skipped() {
        let (mut ctx, programs) = setup();
        ctx.uniforms = vec!["screenSize"];
        render(&mut ctx, &VIEWS[2], programs.get(ProgramName::Reflection), &crate::testing::FakeBuffer, Viewport::new(640, 480));

        assert_eq!(
            ctx.calls,
            vec![
                Call::UseProgram("reflection".into()),
                Call::UploadVertices(RECTANGLE.vertices.to_vec()),
                Call::SetUniformVec2("screenSize".into(), [640.0, 480.0]),
                Call::DrawArrays(Topology::TriangleFan, 4),
            ]
        );
    }

    #[test]
    fn views_cover_every_program_once() {
        let mut programs: Vec<_> = VIEWS.iter().map(|view| view.program).collect();
        programs.dedup();
        assert_eq!(programs, ProgramName::ALL.to_vec());
        assert_ne!(SQUARE.vertices, RECTANGLE.vertices);
    }
}
