use crate::browser;
use crate::config::Config;
use crate::engine::input::FrameInput;
use crate::engine::{self, Game, Hud, Image, Point, Rect, Renderer};
use crate::obstacle::{self, Obstacle};
use crate::sprite::dino::Dino;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

/// ┌──────────────────────── Per Tick Flow ────────────────────────┐
/// │                                                               │
/// │  GameLoop::frame ──► DinoRun::update ──► RunnerStateMachine   │
/// │                                              │                │
/// │        ┌─────────────────────────────────────┤                │
/// │        ▼                                     ▼                │
/// │   Active: World::tick                  GameOver: wait for     │
/// │    1. spawn timer / new obstacle         restart input        │
/// │    2. dino physics + animation                                │
/// │    3. move obstacles, drop expired                            │
/// │    4. collision ──► GameOver                                  │
/// │    5. score + speed                                           │
/// │                                                               │
/// │  GameLoop::frame ──► DinoRun::draw (every frame, both states) │
/// └───────────────────────────────────────────────────────────────┘
pub enum DinoRun {
    /// Waiting for `initialize`, nothing to update or draw yet
    Loading,

    /// Config read, world built, sprite may still be on its way
    Loaded(Runner),
}

impl DinoRun {
    pub fn new() -> Self {
        DinoRun::Loading
    }

    async fn load_config() -> Config {
        match browser::fetch_json::<Config>(Config::PATH).await {
            Ok(config) => {
                log!("Loaded {}", Config::PATH);
                config
            }
            Err(err) => {
                log!("{} unavailable, using defaults : {:#}", Config::PATH, err);
                Config::default()
            }
        }
    }

    /// Fills `image` in the background; the dino is simply not drawn until
    /// then.
    fn load_sprite(image: Image, path: String) {
        browser::spawn_local(async move {
            match engine::load_image(&path).await {
                Ok(element) => {
                    image.set_loaded(element);
                    log!("Dino sprite sheet loaded!");
                }
                Err(err) => error!("Could not load dino sprite {} : {:#?}", path, err),
            }
        });
    }
}

impl Default for DinoRun {
    fn default() -> Self {
        DinoRun::new()
    }
}

#[async_trait(?Send)]
impl Game for DinoRun {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            DinoRun::Loading => {
                let canvas = browser::canvas()?;
                let config = Self::load_config()
                    .await
                    .with_canvas_size(canvas.width() as f32, canvas.height() as f32);
                config.validate().context("Invalid game configuration")?;

                let sprite = Image::pending();
                Self::load_sprite(sprite.clone(), config.sprite.path.clone());

                let world = World::new(Rc::new(config), sprite, StdRng::from_entropy());
                let hud = Rc::new(browser::DomHud::new()?);
                Ok(Box::new(DinoRun::Loaded(Runner::new(world, hud))))
            }
            DinoRun::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, input: &FrameInput) {
        if let DinoRun::Loaded(runner) = self {
            runner.update(input);
        }
    }

    fn draw(&self, renderer: &dyn Renderer) {
        if let DinoRun::Loaded(runner) = self {
            runner.draw(renderer);
        }
    }
}

/// Owns the state machine and the HUD it reports to
pub struct Runner {
    // taken out and put back on every update, transitions consume the state
    machine: Option<RunnerStateMachine>,
    hud: Rc<dyn Hud>,
}

impl Runner {
    pub fn new(world: World, hud: Rc<dyn Hud>) -> Self {
        let state = RunnerState::start(world, hud.as_ref());
        Runner {
            machine: Some(state.into()),
            hud,
        }
    }

    pub fn update(&mut self, input: &FrameInput) {
        if let Some(machine) = self.machine.take() {
            self.machine
                .replace(machine.update(input, self.hud.as_ref()));
        }
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        if let Some(machine) = &self.machine {
            machine.world().draw(renderer);
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.machine, Some(RunnerStateMachine::GameOver(_)))
    }

    pub fn world(&self) -> Option<&World> {
        self.machine.as_ref().map(RunnerStateMachine::world)
    }
}

// typestate markers
pub struct Active;
pub struct GameOver;

pub struct RunnerState<S> {
    world: World,
    _state: S,
}

enum IsRunning {
    Continue(RunnerState<Active>),
    Crashed(RunnerState<GameOver>),
}

impl<S> RunnerState<S> {
    fn world(&self) -> &World {
        &self.world
    }
}

impl RunnerState<Active> {
    fn start(world: World, hud: &dyn Hud) -> Self {
        report(hud.hide_overlay());
        report(hud.show_score(world.score));
        RunnerState {
            world,
            _state: Active,
        }
    }

    fn update(mut self, input: &FrameInput, hud: &dyn Hud) -> IsRunning {
        if input.jump {
            self.world.dino.jump();
        }
        match self.world.tick() {
            Tick::Running => {
                report(hud.show_score(self.world.score));
                IsRunning::Continue(self)
            }
            Tick::Crashed => IsRunning::Crashed(self.end(hud)),
        }
    }

    fn end(self, hud: &dyn Hud) -> RunnerState<GameOver> {
        log!("Game over, final score {}", self.world.score);
        report(hud.show_overlay(&self.world.config.game_over_message));
        RunnerState {
            world: self.world,
            _state: GameOver,
        }
    }
}

impl RunnerState<GameOver> {
    fn restart(self, hud: &dyn Hud) -> RunnerState<Active> {
        log!("Restarting after a score of {}", self.world.score);
        RunnerState::start(self.world.reset(), hud)
    }
}

enum RunnerStateMachine {
    Active(RunnerState<Active>),
    GameOver(RunnerState<GameOver>),
}

impl From<RunnerState<Active>> for RunnerStateMachine {
    fn from(state: RunnerState<Active>) -> Self {
        RunnerStateMachine::Active(state)
    }
}

impl From<RunnerState<GameOver>> for RunnerStateMachine {
    fn from(state: RunnerState<GameOver>) -> Self {
        RunnerStateMachine::GameOver(state)
    }
}

impl From<IsRunning> for RunnerStateMachine {
    fn from(is_running: IsRunning) -> Self {
        match is_running {
            IsRunning::Continue(active) => active.into(),
            IsRunning::Crashed(game_over) => game_over.into(),
        }
    }
}

impl RunnerStateMachine {
    /// Jump only matters while active, restart only after a crash
    fn update(self, input: &FrameInput, hud: &dyn Hud) -> Self {
        match self {
            RunnerStateMachine::Active(state) => state.update(input, hud).into(),
            RunnerStateMachine::GameOver(state) if input.restart => state.restart(hud).into(),
            RunnerStateMachine::GameOver(state) => state.into(),
        }
    }

    fn world(&self) -> &World {
        match self {
            RunnerStateMachine::Active(state) => state.world(),
            RunnerStateMachine::GameOver(state) => state.world(),
        }
    }
}

fn report(result: Result<()>) {
    if let Err(err) = result {
        error!("HUD update failed : {:#?}", err);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    Crashed,
}

/// Everything one run of the game mutates
pub struct World {
    config: Rc<Config>,
    sprite: Image,
    dino: Dino,
    /// spawn order
    obstacles: Vec<Obstacle>,
    score: u32,
    speed: f32,
    spawn_timer: u32,
    spawn_frequency: f32,
    rng: StdRng,
}

impl World {
    pub fn new(config: Rc<Config>, sprite: Image, rng: StdRng) -> Self {
        World {
            dino: Dino::new(&config, sprite.clone()),
            obstacles: Vec::new(),
            score: 0,
            speed: config.initial_speed,
            spawn_timer: 0,
            spawn_frequency: config.initial_spawn_frequency,
            config,
            sprite,
            rng,
        }
    }

    /// Fresh dino, obstacles and counters. Config, sprite and the random
    /// stream carry over.
    pub fn reset(self) -> Self {
        World::new(self.config, self.sprite, self.rng)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn dino(&self) -> &Dino {
        &self.dino
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn tick(&mut self) -> Tick {
        self.spawn_timer += 1;
        if self.spawn_timer as f32 >= self.spawn_frequency {
            self.spawn_obstacle();
        }

        self.dino.update();

        for obstacle in self.obstacles.iter_mut() {
            obstacle::update(obstacle);
        }
        self.obstacles.retain(|obstacle| !obstacle::is_off_screen(obstacle));

        if self.dino_collides() {
            return Tick::Crashed;
        }
        self.dino.animate();

        self.score += 1;
        if self.score % self.config.speed_step == 0 {
            self.speed += self.config.speed_increment;
        }
        Tick::Running
    }

    fn spawn_obstacle(&mut self) {
        let x = self.config.width + self.config.spawn_offset;
        let obstacle = obstacle::spawn(x, self.speed, &self.config, &mut self.rng);
        self.obstacles.push(obstacle);
        self.spawn_frequency = self.config.spawn_frequency.sample(&mut self.rng);
        self.spawn_timer = 0;
    }

    fn dino_collides(&self) -> bool {
        let hitbox = self.dino.bounding_box();
        self.obstacles
            .iter()
            .any(|obstacle| hitbox.intersects(&obstacle::bounding_box(obstacle)))
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        renderer.clear(&Rect {
            x: 0.0,
            y: 0.0,
            width: self.config.width,
            height: self.config.height,
        });
        // draw order : dino -> obstacles -> ground
        self.dino.draw(renderer);
        for obstacle in &self.obstacles {
            obstacle::draw(obstacle, renderer, &self.config.obstacle_color);
        }
        let ground_y = self.config.ground_y();
        renderer.stroke_line(
            Point { x: 0.0, y: ground_y },
            Point {
                x: self.config.width,
                y: ground_y,
            },
        );
    }
}
