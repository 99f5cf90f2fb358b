// sprite/
// ├── mod.rs   : frame strip layout + run animation cadence
// ├── state.rs : Running / Jumping typestates and the physics they share
// └── dino.rs  : state machine wrapper the game talks to
pub mod dino;
pub mod state;

use crate::config::SpriteConfig;
use crate::engine::{Point, Rect, Size};

/// Frames laid out side by side on one row of the sprite image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteStrip {
    frame: Size,
    frames: u8,
}

impl SpriteStrip {
    pub fn new(config: &SpriteConfig) -> Self {
        SpriteStrip {
            frame: Size {
                width: config.frame_width,
                height: config.frame_height,
            },
            frames: config.frames,
        }
    }

    /// Source rectangle of `frame` inside the image
    pub fn frame_rect(&self, frame: u8) -> Rect {
        Rect {
            x: f32::from(frame % self.frames) * self.frame.width,
            y: 0.0,
            width: self.frame.width,
            height: self.frame.height,
        }
    }

    /// Where a frame lands on the canvas for a hitbox of `size` at `position`.
    /// The frame is scaled so its height matches the hitbox and shifted down
    /// by the difference between the two heights.
    pub fn destination(&self, position: Point, size: f32) -> Rect {
        let scale = size / self.frame.height;
        Rect {
            x: position.x,
            y: position.y - (self.frame.height - size),
            width: self.frame.width * scale,
            height: self.frame.height * scale,
        }
    }
}

/// Looping frame counter, one step every `ticks_per_frame` updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    frame: u8,
    timer: u8,
    frames: u8,
    ticks_per_frame: u8,
}

impl Animation {
    pub fn new(frames: u8, ticks_per_frame: u8) -> Self {
        Animation {
            frame: 0,
            timer: 0,
            frames,
            ticks_per_frame,
        }
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn advance(mut self) -> Self {
        self.timer += 1;
        if self.timer >= self.ticks_per_frame {
            self.timer = 0;
            self.frame = (self.frame + 1) % self.frames;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn animation_cycles_two_frames_every_seven_ticks() {
        let mut animation = Animation::new(2, 7);
        let mut frames = Vec::new();
        for _ in 0..21 {
            animation = animation.advance();
            frames.push(animation.frame());
        }
        assert_eq!(&frames[..6], &[0; 6]);
        assert_eq!(&frames[6..13], &[1; 7]);
        assert_eq!(&frames[13..20], &[0; 7]);
        assert_eq!(frames[20], 1);
    }

    #[test]
    fn frame_rects_step_along_the_strip() {
        let strip = SpriteStrip::new(&SpriteConfig::default());
        assert_relative_eq!(strip.frame_rect(0).x, 0.0);
        assert_relative_eq!(strip.frame_rect(1).x, 45.0);
        assert_relative_eq!(strip.frame_rect(1).height, 53.0);
    }

    #[test]
    fn destination_scales_frame_to_hitbox_height() {
        let strip = SpriteStrip::new(&SpriteConfig::default());
        let destination = strip.destination(Point { x: 50.0, y: 195.0 }, 75.0);
        assert_relative_eq!(destination.x, 50.0);
        assert_relative_eq!(destination.y, 217.0);
        assert_relative_eq!(destination.height, 75.0);
        assert_relative_eq!(destination.width, 45.0 * 75.0 / 53.0);
    }
}
