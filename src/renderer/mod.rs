//! WebGPU rendering module
//!
//! Every frame is a single batch of textured quads drawn from one atlas.

pub mod assets;
pub mod pipeline;
pub mod sprite;
pub mod sprite_buffer;
pub mod vertex;

pub use assets::{AssetError, AtlasImage, ShaderSources};
pub use pipeline::SpriteRenderer;
pub use sprite::{AtlasRegion, Sprite, atlas};
pub use sprite_buffer::{GpuSpriteBuffers, MAX_QUADS, SpriteBuffer};
pub use vertex::Vertex;
