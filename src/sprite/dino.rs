use crate::config::Config;
use crate::engine::{Image, Point, Rect, Renderer, Size};
use crate::sprite::state::{DinoContext, DinoState, IsJumping, Jumping, Physics, Running};
use crate::sprite::{Animation, SpriteStrip};

/// ┌──────────── State Transition Flow ────────────┐
/// │  From State  →  Event   →  To State           │
/// ├───────────────────────────────────────────────┤
/// │  Running     →  Jump    →  Jumping            │
/// │  Running     →  Update  →  Running (no-op)    │
/// │  Jumping     →  Update  →  Running (landed)   │
/// │  Jumping     →  Jump    →  Jumping (ignored)  │
/// └───────────────────────────────────────────────┘
pub enum Event {
    Jump,
    Update,
}

#[derive(Debug, Copy, Clone)]
enum DinoStateMachine {
    Running(DinoState<Running>),
    Jumping(DinoState<Jumping>),
}

impl From<DinoState<Running>> for DinoStateMachine {
    fn from(state: DinoState<Running>) -> Self {
        DinoStateMachine::Running(state)
    }
}

impl From<DinoState<Jumping>> for DinoStateMachine {
    fn from(state: DinoState<Jumping>) -> Self {
        DinoStateMachine::Jumping(state)
    }
}

impl From<IsJumping> for DinoStateMachine {
    fn from(is_jumping: IsJumping) -> Self {
        match is_jumping {
            IsJumping::Done(running_state) => running_state.into(),
            IsJumping::InProgress(jumping_state) => jumping_state.into(),
        }
    }
}

impl DinoStateMachine {
    // consumes the old state so it can't be used after the transition
    fn transition(self, event: Event) -> Self {
        use DinoStateMachine::*;
        match (self, event) {
            (Running(state), Event::Jump) => state.jump().into(),
            (Running(state), Event::Update) => state.into(),
            (Jumping(state), Event::Update) => state.update().into(),
            // already airborne
            (Jumping(_), Event::Jump) => self,
        }
    }

    fn animate(self) -> Self {
        match self {
            DinoStateMachine::Running(state) => state.animate().into(),
            DinoStateMachine::Jumping(state) => state.animate().into(),
        }
    }

    fn context(&self) -> &DinoContext {
        match self {
            DinoStateMachine::Running(state) => state.context(),
            DinoStateMachine::Jumping(state) => state.context(),
        }
    }
}

pub struct Dino {
    state: DinoStateMachine,
    size: f32,
    strip: SpriteStrip,
    image: Image,
}

impl Dino {
    pub fn new(config: &Config, image: Image) -> Self {
        let animation = Animation::new(config.sprite.frames, config.sprite.ticks_per_frame);
        Dino {
            state: DinoState::new(config.dino_x, Physics::new(config), animation).into(),
            size: config.dino_size,
            strip: SpriteStrip::new(&config.sprite),
            image,
        }
    }

    /// Physics only, see `animate` for the run cycle
    pub fn update(&mut self) {
        self.state = self.state.transition(Event::Update);
    }

    pub fn animate(&mut self) {
        self.state = self.state.animate();
    }

    /// No-op while airborne
    pub fn jump(&mut self) {
        self.state = self.state.transition(Event::Jump);
    }

    pub fn position(&self) -> Point {
        self.state.context().position
    }

    pub fn velocity_y(&self) -> f32 {
        self.state.context().velocity_y
    }

    pub fn frame(&self) -> u8 {
        self.state.context().animation.frame()
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.state, DinoStateMachine::Jumping(_))
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(
            self.position(),
            Size {
                width: self.size,
                height: self.size,
            },
        )
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        if !self.image.is_ready() {
            return;
        }
        let frame = self.strip.frame_rect(self.frame());
        let destination = self.strip.destination(self.position(), self.size);
        self.image.draw(renderer, &frame, &destination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dino() -> Dino {
        Dino::new(&Config::default(), Image::pending())
    }

    #[test]
    fn starts_grounded_at_resting_height() {
        let dino = dino();
        assert!(!dino.is_airborne());
        assert_relative_eq!(dino.position().x, 50.0);
        assert_relative_eq!(dino.position().y, Config::default().dino_start_y());
        assert_relative_eq!(dino.velocity_y(), 0.0);
    }

    #[test]
    fn jump_sets_upward_velocity() {
        let mut dino = dino();
        dino.jump();
        assert!(dino.is_airborne());
        assert_relative_eq!(dino.velocity_y(), -20.0);
    }

    #[test]
    fn second_jump_while_airborne_changes_nothing() {
        let mut dino = dino();
        dino.jump();
        dino.update();
        let velocity = dino.velocity_y();
        let y = dino.position().y;

        dino.jump();
        assert_relative_eq!(dino.velocity_y(), velocity);
        assert_relative_eq!(dino.position().y, y);
    }

    #[test]
    fn gravity_applies_before_moving() {
        let mut dino = dino();
        let start = dino.position().y;
        dino.jump();
        dino.update();
        assert_relative_eq!(dino.velocity_y(), -19.2);
        assert_relative_eq!(dino.position().y, start - 19.2);
    }

    #[test]
    fn lands_back_on_resting_height() {
        let mut dino = dino();
        let resting = dino.position().y;
        dino.jump();
        let mut ticks = 0;
        while dino.is_airborne() {
            dino.update();
            assert!(dino.position().y <= resting);
            ticks += 1;
            assert!(ticks < 200, "dino never landed");
        }
        assert_relative_eq!(dino.position().y, resting);
        assert_relative_eq!(dino.velocity_y(), 0.0);
        // -20 + 0.8 * n crosses zero height again after about 50 ticks
        assert!((49..=52).contains(&ticks));
    }

    #[test]
    fn can_jump_again_after_landing() {
        let mut dino = dino();
        dino.jump();
        while dino.is_airborne() {
            dino.update();
        }
        dino.jump();
        assert!(dino.is_airborne());
    }

    #[test]
    fn animation_runs_while_jumping() {
        let mut dino = dino();
        dino.jump();
        for _ in 0..7 {
            dino.update();
            dino.animate();
        }
        assert!(dino.is_airborne());
        assert_eq!(dino.frame(), 1);
    }

    #[test]
    fn physics_update_leaves_the_animation_alone() {
        let mut dino = dino();
        for _ in 0..20 {
            dino.update();
        }
        assert_eq!(dino.frame(), 0);
        dino.jump();
        for _ in 0..20 {
            dino.update();
        }
        assert_eq!(dino.frame(), 0);
    }

    #[test]
    fn hitbox_is_a_square_at_the_position() {
        let dino = dino();
        let hitbox = dino.bounding_box();
        assert_relative_eq!(hitbox.width, 75.0);
        assert_relative_eq!(hitbox.height, 75.0);
        assert_relative_eq!(hitbox.y, dino.position().y);
    }
}
