//! Batched sprite geometry
//!
//! Every sprite becomes one quad (4 vertices). All quads of a frame are drawn
//! with a single indexed draw call. Index data for quad `n` depends only on
//! `n`, so indices survive `clear()` and are only generated for quads past
//! the high-water mark.

use super::sprite::Sprite;
use super::vertex::Vertex;
use crate::matrix::SpriteMatrix;

use glam::Vec2;

/// Quads addressable with 16-bit indices
pub const MAX_QUADS: u32 = (u16::MAX as u32 + 1) / 4;

const INDICES_PER_QUAD: u32 = 6;

/// CPU-side vertex and index lists for one frame of sprites
#[derive(Debug, Clone)]
pub struct SpriteBuffer {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    /// Quads appended since the last clear
    vertex_count: u32,
    /// Quads whose indices already exist
    index_count: u32,
    tex_width: f32,
    tex_height: f32,
}

impl Default for SpriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteBuffer {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_count: 0,
            index_count: 0,
            tex_width: 1.0,
            tex_height: 1.0,
        }
    }

    /// Pixel size of the bound atlas, used to normalize atlas regions
    pub fn set_texture_size(&mut self, width: u32, height: u32) {
        self.tex_width = width as f32;
        self.tex_height = height as f32;
    }

    /// Drop this frame's vertices; generated indices are kept
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.vertex_count = 0;
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Indices consumed by `draw`
    pub fn draw_index_count(&self) -> u32 {
        self.vertex_count * INDICES_PER_QUAD
    }

    /// Atlas region normalized to texture coordinates `(s, t, w, h)`.
    /// A zero-sized texture yields a degenerate region at the origin.
    fn tex_rect(&self, sprite: &Sprite) -> (f32, f32, f32, f32) {
        if self.tex_width <= 0.0 || self.tex_height <= 0.0 {
            return (0.0, 0.0, 0.0, 0.0);
        }
        let r = &sprite.region;
        (
            r.x / self.tex_width,
            r.y / self.tex_height,
            r.w / self.tex_width,
            r.h / self.tex_height,
        )
    }

    fn push_quad(&mut self, corners: [Vec2; 4], sprite: &Sprite) {
        if self.vertex_count >= MAX_QUADS {
            debug_assert!(false, "sprite batch is full ({MAX_QUADS} quads)");
            return;
        }

        let (s, t, w, h) = self.tex_rect(sprite);
        let tex = [(s, t), (s + w, t), (s + w, t + h), (s, t + h)];
        for (corner, (u, v)) in corners.into_iter().zip(tex) {
            self.vertices
                .push(Vertex::new(corner.x, corner.y, u, v, sprite.color));
        }
        self.vertex_count += 1;
    }

    /// Append a sprite whose `(x, y)` is its top-left corner
    pub fn append(&mut self, sprite: &Sprite) {
        let (x0, y0) = (sprite.x, sprite.y);
        let (x1, y1) = (sprite.x + sprite.w, sprite.y + sprite.h);
        self.push_quad(
            [
                Vec2::new(x0, y0),
                Vec2::new(x1, y0),
                Vec2::new(x1, y1),
                Vec2::new(x0, y1),
            ],
            sprite,
        );
    }

    /// Append a sprite whose `(x, y)` is its centre. The corner offsets go
    /// through `matrix` before the centre is added.
    pub fn append_transformed(&mut self, sprite: &Sprite, matrix: &SpriteMatrix) {
        let center = Vec2::new(sprite.x, sprite.y);
        let (hw, hh) = (sprite.w * 0.5, sprite.h * 0.5);
        let corners = [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ]
        .map(|offset| center + matrix.transform(offset));
        self.push_quad(corners, sprite);
    }

    /// Emit indices for quads `index_count..vertex_count`.
    /// Returns true if any were added.
    pub fn generate_indices(&mut self) -> bool {
        if self.index_count >= self.vertex_count {
            return false;
        }

        self.indices
            .reserve(((self.vertex_count - self.index_count) * INDICES_PER_QUAD) as usize);
        for quad in self.index_count..self.vertex_count {
            let base = (quad * 4) as u16;
            self.indices
                .extend_from_slice(&[base, base + 1, base + 3, base + 3, base + 1, base + 2]);
        }

        self.index_count = self.vertex_count;
        true
    }

    /// Send this frame's batch to the GPU. Index data is rewritten only when
    /// new indices were generated; vertex data is rewritten every call.
    pub fn upload(&mut self, gpu: &mut GpuSpriteBuffers, device: &wgpu::Device, queue: &wgpu::Queue) {
        let new_indices = self.generate_indices();
        if gpu.reserve_indices(device, self.indices.len()) || new_indices {
            queue.write_buffer(&gpu.index_buffer, 0, bytemuck::cast_slice(&self.indices));
        }

        gpu.reserve_vertices(device, self.vertices.len());
        if !self.vertices.is_empty() {
            queue.write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
    }

    /// Record one indexed draw covering every quad of this frame
    pub fn draw(&self, gpu: &GpuSpriteBuffers, pass: &mut wgpu::RenderPass<'_>) {
        if self.is_empty() {
            return;
        }
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.draw_index_count(), 0, 0..1);
    }
}

/// GPU buffers backing a [`SpriteBuffer`], grown by powers of two
pub struct GpuSpriteBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
}

impl GpuSpriteBuffers {
    const INITIAL_QUADS: usize = 64;

    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_capacity = Self::INITIAL_QUADS * 4;
        let index_capacity = Self::INITIAL_QUADS * INDICES_PER_QUAD as usize;
        Self {
            vertex_buffer: Self::create_vertex_buffer(device, vertex_capacity),
            index_buffer: Self::create_index_buffer(device, index_capacity),
            vertex_capacity,
            index_capacity,
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, vertices: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_vertices"),
            size: (vertices * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_index_buffer(device: &wgpu::Device, indices: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_indices"),
            size: (indices * std::mem::size_of::<u16>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Returns true if the vertex buffer was reallocated
    fn reserve_vertices(&mut self, device: &wgpu::Device, needed: usize) -> bool {
        if needed <= self.vertex_capacity {
            return false;
        }
        self.vertex_capacity = needed.next_power_of_two();
        self.vertex_buffer = Self::create_vertex_buffer(device, self.vertex_capacity);
        log::debug!("Sprite vertex buffer grown to {} vertices", self.vertex_capacity);
        true
    }

    /// Returns true if the index buffer was reallocated (its contents are lost)
    fn reserve_indices(&mut self, device: &wgpu::Device, needed: usize) -> bool {
        if needed <= self.index_capacity {
            return false;
        }
        // Keep the byte size a multiple of 4 for buffer copies
        self.index_capacity = needed.next_power_of_two().max(2);
        self.index_buffer = Self::create_index_buffer(device, self.index_capacity);
        log::debug!("Sprite index buffer grown to {} indices", self.index_capacity);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::sprite::{AtlasRegion, atlas};

    fn buffer_with_atlas() -> SpriteBuffer {
        let mut buffer = SpriteBuffer::new();
        buffer.set_texture_size(64, 32);
        buffer
    }

    #[test]
    fn test_append_top_left_anchor() {
        let mut buffer = buffer_with_atlas();
        buffer.append(&Sprite::new(10.0, 20.0, atlas::BALL));

        assert_eq!(buffer.vertex_count(), 1);
        let v = buffer.vertices();
        assert_eq!(v.len(), 4);
        assert_eq!(v[0].position, [10.0, 20.0]);
        assert_eq!(v[1].position, [26.0, 20.0]);
        assert_eq!(v[2].position, [26.0, 36.0]);
        assert_eq!(v[3].position, [10.0, 36.0]);

        // Ball region (0, 16, 16, 16) in a 64x32 atlas
        assert_eq!(v[0].tex_coords, [0.0, 0.5]);
        assert_eq!(v[2].tex_coords, [0.25, 1.0]);
        assert_eq!(v[0].color, [1.0; 4]);
    }

    #[test]
    fn test_append_transformed_is_centred() {
        let mut buffer = buffer_with_atlas();
        let sprite = Sprite::new(100.0, 50.0, atlas::PADDLE);
        buffer.append_transformed(&sprite, &SpriteMatrix::identity());

        let v = buffer.vertices();
        assert_eq!(v[0].position, [68.0, 42.0]);
        assert_eq!(v[2].position, [132.0, 58.0]);
        assert_eq!(v[1].tex_coords, [1.0, 0.0]);
    }

    #[test]
    fn test_append_transformed_rotates_corners() {
        let mut buffer = buffer_with_atlas();
        let sprite = Sprite::new(0.0, 0.0, atlas::BALL).with_size(4.0, 2.0);
        buffer.append_transformed(&sprite, &SpriteMatrix::from_rotation(90.0));

        // Top-left offset (-2, -1) rotated a quarter turn becomes (1, -2)
        let [x, y] = buffer.vertices()[0].position;
        assert!((x - 1.0).abs() < 1e-5);
        assert!((y + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_tint_reaches_every_vertex() {
        let mut buffer = buffer_with_atlas();
        let red = [1.0, 0.0, 0.0, 0.5];
        buffer.append(&Sprite::new(0.0, 0.0, atlas::MARKER).with_color(red));
        assert!(buffer.vertices().iter().all(|v| v.color == red));
    }

    #[test]
    fn test_zero_texture_size_is_degenerate_not_nan() {
        let mut buffer = SpriteBuffer::new();
        buffer.set_texture_size(0, 0);
        buffer.append(&Sprite::new(0.0, 0.0, AtlasRegion::new(0.0, 0.0, 0.0, 0.0)));
        assert!(buffer.vertices().iter().all(|v| v.tex_coords == [0.0, 0.0]));
    }

    #[test]
    fn test_index_pattern() {
        let mut buffer = buffer_with_atlas();
        buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));
        buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));

        assert!(buffer.generate_indices());
        assert_eq!(buffer.indices(), &[0, 1, 3, 3, 1, 2, 4, 5, 7, 7, 5, 6]);
        assert_eq!(buffer.index_count(), 2);
        assert_eq!(buffer.draw_index_count(), 12);
        assert!(!buffer.generate_indices());
    }

    #[test]
    fn test_indices_reused_across_clear() {
        let mut buffer = buffer_with_atlas();
        for _ in 0..3 {
            buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));
        }
        assert!(buffer.generate_indices());
        assert_eq!(buffer.indices().len(), 18);

        buffer.clear();
        assert_eq!(buffer.vertex_count(), 0);
        assert_eq!(buffer.index_count(), 3);
        assert!(buffer.vertices().is_empty());

        // Fewer quads than before: nothing new to generate
        buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));
        assert!(!buffer.generate_indices());
        assert_eq!(buffer.indices().len(), 18);

        buffer.clear();
        for _ in 0..5 {
            buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));
        }
        assert!(buffer.generate_indices());
        assert_eq!(buffer.indices().len(), 18 + 6 * 2);
        assert_eq!(&buffer.indices()[24..], &[16, 17, 19, 19, 17, 18]);
    }

    #[test]
    fn test_indices_cover_every_quad_after_generate() {
        let mut buffer = buffer_with_atlas();
        for n in [4u32, 2, 7, 7, 1] {
            buffer.clear();
            for _ in 0..n {
                buffer.append(&Sprite::new(0.0, 0.0, atlas::BALL));
            }
            buffer.generate_indices();
            assert!(buffer.index_count() >= buffer.vertex_count());
            assert_eq!(buffer.indices().len() as u32, buffer.index_count() * 6);
        }
    }
}
