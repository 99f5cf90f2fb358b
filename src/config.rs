use anyhow::{anyhow, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half open `[min, max)` range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.min..self.max)
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.min < self.max && self.min >= 0.0 {
            Ok(())
        } else {
            Err(anyhow!(
                "{} range [{}, {}) is empty or negative",
                name,
                self.min,
                self.max
            ))
        }
    }
}

/// Layout of the running animation strip: frames side by side, left to right
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub path: String,
    pub frame_width: f32,
    pub frame_height: f32,
    pub frames: u8,
    /// ticks each frame stays on screen
    pub ticks_per_frame: u8,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        SpriteConfig {
            path: "stitch.png".to_string(),
            frame_width: 45.0,
            frame_height: 53.0,
            frames: 2,
            ticks_per_frame: 7,
        }
    }
}

/// Every tuning value of the game. Missing fields in `config.json` keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// taken from the canvas element, never from `config.json`
    #[serde(skip)]
    pub width: f32,
    #[serde(skip)]
    pub height: f32,
    pub dino_x: f32,
    pub dino_size: f32,
    /// gap between the dino's feet and the bottom of the canvas
    pub dino_clearance: f32,
    /// ground line distance from the bottom of the canvas
    pub ground_offset: f32,
    pub jump_speed: f32,
    pub gravity: f32,
    pub initial_speed: f32,
    pub speed_increment: f32,
    /// points between two speed increments
    pub speed_step: u32,
    pub initial_spawn_frequency: f32,
    pub spawn_frequency: Span,
    /// how far past the right edge obstacles appear
    pub spawn_offset: f32,
    pub obstacle_width: Span,
    pub obstacle_height: Span,
    /// obstacle tops sit this far above the ground line, whatever their height
    pub obstacle_y_offset: f32,
    pub obstacle_color: String,
    pub sprite: SpriteConfig,
    pub game_over_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 800.0,
            height: 300.0,
            dino_x: 50.0,
            dino_size: 75.0,
            dino_clearance: 30.0,
            ground_offset: 20.0,
            jump_speed: 20.0,
            gravity: 0.8,
            initial_speed: 5.0,
            speed_increment: 0.75,
            speed_step: 100,
            initial_spawn_frequency: 100.0,
            spawn_frequency: Span {
                min: 100.0,
                max: 150.0,
            },
            spawn_offset: 35.0,
            obstacle_width: Span {
                min: 20.0,
                max: 50.0,
            },
            obstacle_height: Span {
                min: 30.0,
                max: 80.0,
            },
            obstacle_y_offset: 50.0,
            obstacle_color: "grey".to_string(),
            sprite: SpriteConfig::default(),
            game_over_message: "YOU ARE DEAD, NOOB!.".to_string(),
        }
    }
}

impl Config {
    pub const PATH: &'static str = "config.json";

    pub fn with_canvas_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Resting y of the dino's top edge
    pub fn dino_start_y(&self) -> f32 {
        self.height - self.dino_size - self.dino_clearance
    }

    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_offset
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(anyhow!(
                "canvas must have a positive size, got {}x{}",
                self.width,
                self.height
            ));
        }
        if self.dino_size <= 0.0 {
            return Err(anyhow!("dino_size must be positive, got {}", self.dino_size));
        }
        if self.jump_speed <= 0.0 || self.gravity <= 0.0 {
            return Err(anyhow!(
                "jump_speed and gravity must be positive, got {} and {}",
                self.jump_speed,
                self.gravity
            ));
        }
        if self.speed_step == 0 {
            return Err(anyhow!("speed_step must be at least 1"));
        }
        if self.sprite.frames == 0 || self.sprite.ticks_per_frame == 0 {
            return Err(anyhow!(
                "sprite needs at least one frame and one tick per frame"
            ));
        }
        if self.sprite.frame_width <= 0.0 || self.sprite.frame_height <= 0.0 {
            return Err(anyhow!("sprite frames must have a positive size"));
        }
        self.spawn_frequency.check("spawn_frequency")?;
        self.obstacle_width.check("obstacle_width")?;
        self.obstacle_height.check("obstacle_height")?;
        Ok(())
    }
}
