//! The dino's states live behind typestates, so a jump can only start from
//! `Running` and only a `Jumping` dino can land:
//! - PUBLIC  : DinoState and DinoContext
//! - PRIVATE : the context builders used by the transitions
use crate::config::Config;
use crate::engine::Point;
use crate::sprite::Animation;

#[derive(Debug, Copy, Clone)]
pub struct Running;

#[derive(Debug, Copy, Clone)]
pub struct Jumping;

/// Jump tuning, copied out of the config
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Physics {
    pub jump_speed: f32,
    pub gravity: f32,
    pub resting_y: f32,
}

impl Physics {
    pub fn new(config: &Config) -> Self {
        Physics {
            jump_speed: config.jump_speed,
            gravity: config.gravity,
            resting_y: config.dino_start_y(),
        }
    }
}

pub enum IsJumping {
    Done(DinoState<Running>),
    InProgress(DinoState<Jumping>),
}

#[derive(Debug, Copy, Clone)]
/// Shared data for :
/// - physics : position + vertical velocity
/// - display : run animation
pub struct DinoContext {
    pub position: Point,
    pub velocity_y: f32,
    pub animation: Animation,
    physics: Physics,
}

#[derive(Debug, Copy, Clone)]
pub struct DinoState<S> {
    context: DinoContext,
    // never read, only tells the states apart at compile time
    _state: S,
}

impl<S> DinoState<S> {
    pub fn context(&self) -> &DinoContext {
        &self.context
    }

    /// steps the run animation, independent of physics
    pub fn animate(mut self) -> Self {
        self.context = self.context.animate();
        self
    }
}

impl DinoState<Running> {
    pub fn new(x: f32, physics: Physics, animation: Animation) -> Self {
        DinoState {
            context: DinoContext {
                position: Point {
                    x,
                    y: physics.resting_y,
                },
                velocity_y: 0.0,
                animation,
                physics,
            },
            _state: Running,
        }
    }

    pub fn jump(self) -> DinoState<Jumping> {
        let jump_speed = self.context.physics.jump_speed;
        DinoState {
            // negative because the origin is top left
            context: self.context.set_vertical_velocity(-jump_speed),
            _state: Jumping,
        }
    }
}

impl DinoState<Jumping> {
    pub fn update(mut self) -> IsJumping {
        self.context = self.context.fall();
        if self.context.position.y >= self.context.physics.resting_y {
            IsJumping::Done(self.land())
        } else {
            IsJumping::InProgress(self)
        }
    }

    pub fn land(self) -> DinoState<Running> {
        DinoState {
            context: self.context.rest().set_vertical_velocity(0.0),
            _state: Running,
        }
    }
}

impl DinoContext {
    /// one tick of gravity, then move
    fn fall(mut self) -> Self {
        self.velocity_y += self.physics.gravity;
        self.position.y += self.velocity_y;
        self
    }

    fn animate(mut self) -> Self {
        self.animation = self.animation.advance();
        self
    }

    fn rest(mut self) -> Self {
        self.position.y = self.physics.resting_y;
        self
    }

    fn set_vertical_velocity(mut self, y: f32) -> Self {
        self.velocity_y = y;
        self
    }
}
