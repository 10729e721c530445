#[cfg(feature = "assimp")]
mod assimp_import;
mod geometry;
mod gltf_import;
pub mod load;

pub use load::load;
