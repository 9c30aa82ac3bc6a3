//! Per-frame driver
//!
//! Owns the simulation state, the frame's debug markers and the sprite batch.
//! Each frame runs exactly one tick and rebuilds the batch from scratch.

use crate::renderer::sprite::{Sprite, atlas};
use crate::renderer::sprite_buffer::SpriteBuffer;
use crate::renderer::vertex::colors;
use crate::settings::Settings;
use crate::sim::{DebugMarkers, GameState, MarkerKind, TickInput, tick};

pub struct Game {
    pub state: GameState,
    pub markers: DebugMarkers,
    sprites: SpriteBuffer,
    show_markers: bool,
}

impl Game {
    pub fn new(settings: &Settings) -> Self {
        Self::from_state(GameState::new(settings), settings.debug_markers)
    }

    pub fn from_state(state: GameState, show_markers: bool) -> Self {
        Self {
            state,
            markers: DebugMarkers::new(),
            sprites: SpriteBuffer::new(),
            show_markers,
        }
    }

    /// Atlas pixel size, known once the renderer has loaded the texture
    pub fn set_texture_size(&mut self, width: u32, height: u32) {
        self.sprites.set_texture_size(width, height);
    }

    pub fn show_markers(&self) -> bool {
        self.show_markers
    }

    pub fn set_show_markers(&mut self, show: bool) {
        self.show_markers = show;
    }

    pub fn sprites(&self) -> &SpriteBuffer {
        &self.sprites
    }

    /// Advance one tick and rebuild the sprite batch for presentation
    pub fn frame(&mut self, input: &TickInput) -> &mut SpriteBuffer {
        self.markers.clear();
        tick(&mut self.state, input, &mut self.markers);
        self.build_sprites();
        &mut self.sprites
    }

    fn build_sprites(&mut self) {
        self.sprites.clear();

        let half_ball = atlas::BALL.w * 0.5;
        for ball in &self.state.balls {
            let pos = ball.pos();
            self.sprites
                .append(&Sprite::new(pos.x - half_ball, pos.y - half_ball, atlas::BALL));
        }

        let paddle = &self.state.paddle;
        let center = paddle.pos();
        self.sprites.append_transformed(
            &Sprite::new(center.x, center.y, atlas::PADDLE),
            &paddle.matrix(),
        );

        if self.show_markers {
            let half = atlas::MARKER_SIZE * 0.5;
            for marker in self.markers.iter() {
                let color = match marker.kind {
                    MarkerKind::Wall => colors::MARKER_WALL,
                    MarkerKind::Ball => colors::MARKER_BALL,
                    MarkerKind::Paddle => colors::MARKER_PADDLE,
                };
                self.sprites.append(
                    &Sprite::new(marker.pos.x - half, marker.pos.y - half, atlas::MARKER)
                        .with_size(atlas::MARKER_SIZE, atlas::MARKER_SIZE)
                        .with_color(color),
                );
            }
        }
    }
}
