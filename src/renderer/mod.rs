pub mod camera;
mod mesh_render_info;
mod render;
#[allow(clippy::module_inception)]
mod renderer;
mod uniforms;
mod vertex;

pub use render::Scene;
pub use renderer::Renderer;
