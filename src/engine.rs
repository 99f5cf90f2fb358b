use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is single threaded, so Rc RefCell over Arc Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref cast from Javascript type to Rust type
    // - we create the closure ourselves and know its signature
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::{FrameInput, InputEvent};

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &FrameInput);
    fn draw(&self, renderer: &dyn Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// a tab coming back from the background reports one huge delta, cap it
const MAX_FRAME_DELTA: f32 = 250.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
    pending_input: FrameInput,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// Stop signal for a running loop, checked once per animation frame
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    stopped: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

impl GameLoop {
    pub fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
            pending_input: FrameInput::default(),
        }
    }

    pub fn queue_input(&mut self, event: InputEvent) {
        self.pending_input.record(event);
    }

    /// One animation frame
    /// - runs every fixed tick owed since the previous frame
    /// - input gathered since the last tick is handed to the first of them
    /// - draws exactly once, whatever state the game is in
    ///
    /// A slow frame that owes several ticks still draws only once, after the
    /// last of them, so the intermediate states are never shown.
    ///
    /// Returns the number of ticks run.
    pub fn frame(&mut self, perf: f64, game: &mut dyn Game, renderer: &dyn Renderer) -> u32 {
        let delta = ((perf - self.last_frame) as f32).clamp(0.0, MAX_FRAME_DELTA);
        self.accumulated_delta += delta;
        let mut ticks = 0;
        while self.accumulated_delta >= FRAME_SIZE {
            let input = self.pending_input.take();
            game.update(&input);
            self.accumulated_delta -= FRAME_SIZE;
            ticks += 1;
        }
        self.last_frame = perf;
        game.draw(renderer);
        ticks
    }

    pub async fn start(game: impl Game + 'static) -> Result<LoopHandle> {
        let mut input_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop::new(browser::now()?);
        let renderer = CanvasRenderer::new(browser::context()?);
        let handle = LoopHandle::default();
        let signal = handle.clone();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut game_loop.pending_input, &mut input_receiver);
            game_loop.frame(perf, game.as_mut(), &renderer);
            if signal.is_stopped() {
                log!("GameLoop: stopped");
                return;
            }
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    error!("GameLoop: {:#?}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis aligned box, origin top left, y grows downwards
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap on both axes, boxes that only share an edge or a
    /// corner do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Everything the game needs from a drawing surface
pub trait Renderer {
    fn clear(&self, rect: &Rect);
    fn fill_rect(&self, rect: &Rect, color: &str);
    fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect);
    fn stroke_line(&self, from: Point, to: Point);
}

/// Score readout and end of game overlay
pub trait Hud {
    fn show_score(&self, score: u32) -> Result<()>;
    fn show_overlay(&self, message: &str) -> Result<()>;
    fn hide_overlay(&self) -> Result<()>;
}

pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        CanvasRenderer { context }
    }
}

impl Renderer for CanvasRenderer {
    fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x.into(),
            rect.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.x.into(),
            rect.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x.into(),
                frame.y.into(),
                frame.width.into(),
                frame.height.into(),
                destination.x.into(),
                destination.y.into(),
                destination.width.into(),
                destination.height.into(),
            )
        {
            error!("Could not draw image {:#?}", err);
        }
    }

    fn stroke_line(&self, from: Point, to: Point) {
        self.context.begin_path();
        self.context.move_to(from.x.into(), from.y.into());
        self.context.line_to(to.x.into(), to.y.into());
        self.context.stroke();
    }
}

/// Shared handle to an image that may still be loading.
/// Clones point at the same slot, so the loader can fill it in while the
/// game already holds a copy.
#[derive(Debug, Clone, Default)]
pub struct Image {
    element: Rc<RefCell<Option<HtmlImageElement>>>,
}

impl Image {
    pub fn pending() -> Self {
        Image::default()
    }

    pub fn is_ready(&self) -> bool {
        self.element.borrow().is_some()
    }

    pub fn set_loaded(&self, element: HtmlImageElement) {
        *self.element.borrow_mut() = Some(element);
    }

    /// Blits `frame` to `destination` once loaded, returns whether it drew
    pub fn draw(&self, renderer: &dyn Renderer, frame: &Rect, destination: &Rect) -> bool {
        match self.element.borrow().as_ref() {
            Some(element) => {
                renderer.draw_image(element, frame, destination);
                true
            }
            None => false,
        }
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callbacks alive until the image loads or errors
    success_callback.forget();
    error_callback.forget();

    // Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields the channel result
    // - second ? propagates the load error
    rx.await??;

    Ok(image)
}

pub mod input {
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use wasm_bindgen::JsCast;
    use web_sys::{Event, EventTarget, KeyboardEvent};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum InputEvent {
        Jump,
        Restart,
    }

    /// Requests gathered between two ticks. Repeats collapse into one flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameInput {
        pub jump: bool,
        pub restart: bool,
    }

    impl FrameInput {
        pub fn record(&mut self, event: InputEvent) {
            match event {
                InputEvent::Jump => self.jump = true,
                InputEvent::Restart => self.restart = true,
            }
        }

        pub fn take(&mut self) -> FrameInput {
            std::mem::take(self)
        }
    }

    pub fn key_to_event(code: &str) -> Option<InputEvent> {
        match code {
            "Space" => Some(InputEvent::Jump),
            "Enter" => Some(InputEvent::Restart),
            _ => None,
        }
    }

    /// Wires keyboard, mouse and touch into a channel drained every frame
    /// - document keydown : Space -> Jump, Enter -> Restart
    /// - canvas mousedown / touchstart -> Jump
    pub fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
        let (sender, receiver) = unbounded();

        let key_sender = sender.clone();
        let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            if let Some(input) = key_to_event(&event.code()) {
                let _ = key_sender.unbounded_send(input);
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);
        browser::add_event_listener(
            browser::document()?.unchecked_ref::<EventTarget>(),
            "keydown",
            &onkeydown,
        )?;
        onkeydown.forget();

        let canvas = browser::canvas()?;
        for event_name in ["mousedown", "touchstart"] {
            let ontap = pointer_closure(sender.clone());
            browser::add_event_listener(canvas.unchecked_ref::<EventTarget>(), event_name, &ontap)?;
            ontap.forget();
        }

        Ok(receiver)
    }

    fn pointer_closure(
        sender: UnboundedSender<InputEvent>,
    ) -> wasm_bindgen::closure::Closure<dyn FnMut(Event)> {
        browser::closure_wrap(Box::new(move |event: Event| {
            event.prevent_default();
            let _ = sender.unbounded_send(InputEvent::Jump);
        }) as Box<dyn FnMut(Event)>)
    }

    pub fn process_input(pending: &mut FrameInput, receiver: &mut UnboundedReceiver<InputEvent>) {
        // Err : nothing queued right now, or every sender dropped
        while let Ok(event) = receiver.try_recv() {
            pending.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::input::*;
    use super::*;
    use futures::channel::mpsc::unbounded;

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn overlapping_rects_intersect_both_ways() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_and_corners_do_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let right_edge = rect(10.0, 0.0, 10.0, 10.0);
        let bottom_edge = rect(0.0, 10.0, 10.0, 10.0);
        let corner = rect(10.0, 10.0, 5.0, 5.0);
        for other in [right_edge, bottom_edge, corner] {
            assert!(!a.intersects(&other));
            assert!(!other.intersects(&a));
        }
    }

    #[test]
    fn separated_on_one_axis_only_does_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let below = rect(2.0, 30.0, 4.0, 4.0);
        assert!(!a.intersects(&below));
    }

    #[test]
    fn events_sent_before_the_senders_drop_are_still_drained() {
        let (sender, mut receiver) = unbounded();
        sender.unbounded_send(InputEvent::Jump).unwrap();
        drop(sender);
        let mut pending = FrameInput::default();
        process_input(&mut pending, &mut receiver);
        assert!(pending.jump);
        assert!(!pending.restart);

        process_input(&mut pending, &mut receiver);
        assert!(pending.take().jump);
        assert_eq!(pending, FrameInput::default());
    }

    #[test]
    fn repeated_events_collapse_into_flags() {
        let (sender, mut receiver) = unbounded();
        for event in [InputEvent::Jump, InputEvent::Jump, InputEvent::Restart] {
            sender.unbounded_send(event).unwrap();
        }
        let mut pending = FrameInput::default();
        process_input(&mut pending, &mut receiver);
        assert_eq!(
            pending,
            FrameInput {
                jump: true,
                restart: true
            }
        );

        let taken = pending.take();
        assert!(taken.jump);
        assert_eq!(pending, FrameInput::default());
    }

    #[test]
    fn keys_map_to_events() {
        assert_eq!(key_to_event("Space"), Some(InputEvent::Jump));
        assert_eq!(key_to_event("Enter"), Some(InputEvent::Restart));
        assert_eq!(key_to_event("KeyA"), None);
    }

    #[derive(Default)]
    struct CountingGame {
        updates: u32,
        jumps: u32,
        draws: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl Game for CountingGame {
        async fn initialize(&self) -> Result<Box<dyn Game>> {
            Ok(Box::new(CountingGame::default()))
        }

        fn update(&mut self, input: &FrameInput) {
            self.updates += 1;
            if input.jump {
                self.jumps += 1;
            }
        }

        fn draw(&self, _renderer: &dyn Renderer) {
            self.draws.set(self.draws.get() + 1);
        }
    }

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn clear(&self, _rect: &Rect) {}
        fn fill_rect(&self, _rect: &Rect, _color: &str) {}
        fn draw_image(&self, _image: &HtmlImageElement, _frame: &Rect, _destination: &Rect) {}
        fn stroke_line(&self, _from: Point, _to: Point) {}
    }

    #[test]
    fn frame_runs_owed_ticks_and_draws_once() {
        let mut game = CountingGame::default();
        let mut game_loop = GameLoop::new(0.0);

        assert_eq!(game_loop.frame(17.0, &mut game, &NullRenderer), 1);
        assert_eq!(game_loop.frame(51.0, &mut game, &NullRenderer), 2);
        // not enough time elapsed for a tick, still draws
        assert_eq!(game_loop.frame(52.0, &mut game, &NullRenderer), 0);

        assert_eq!(game.updates, 3);
        assert_eq!(game.draws.get(), 3);
    }

    #[test]
    fn slow_frame_draws_once_after_all_its_ticks() {
        let mut game = CountingGame::default();
        let mut game_loop = GameLoop::new(0.0);
        assert_eq!(game_loop.frame(110.0, &mut game, &NullRenderer), 6);
        assert_eq!(game.updates, 6);
        assert_eq!(game.draws.get(), 1);
    }

    #[test]
    fn long_pause_is_clamped() {
        let mut game = CountingGame::default();
        let mut game_loop = GameLoop::new(0.0);
        let ticks = game_loop.frame(60_000.0, &mut game, &NullRenderer);
        assert!(ticks > 0 && ticks <= 15);
    }

    #[test]
    fn queued_input_reaches_only_the_next_tick() {
        let mut game = CountingGame::default();
        let mut game_loop = GameLoop::new(0.0);
        game_loop.queue_input(InputEvent::Jump);
        game_loop.queue_input(InputEvent::Jump);

        // no tick owed yet, the input waits
        game_loop.frame(1.0, &mut game, &NullRenderer);
        assert_eq!(game.jumps, 0);

        game_loop.frame(40.0, &mut game, &NullRenderer);
        assert_eq!(game.updates, 2);
        assert_eq!(game.jumps, 1);
    }

    #[test]
    fn loop_handle_clones_share_the_stop_signal() {
        let handle = LoopHandle::default();
        let observer = handle.clone();
        assert!(!observer.is_stopped());
        handle.stop();
        assert!(observer.is_stopped());
    }

    #[test]
    fn pending_image_skips_drawing() {
        let image = Image::pending();
        assert!(!image.is_ready());
        assert!(!image.draw(&NullRenderer, &Rect::default(), &Rect::default()));
    }
}
