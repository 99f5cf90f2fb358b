// ==================== Imports ====================
use once_cell::unsync::OnceCell;
use wasm_bindgen::prelude::*;

#[macro_use]
pub mod browser;
pub mod config;
pub mod engine;
pub mod game;
pub mod obstacle;
pub mod sprite;

use engine::{GameLoop, LoopHandle};
use game::DinoRun;

thread_local! {
    // set once the loop is running, lets the page stop it
    static RUNNING_LOOP: OnceCell<LoopHandle> = OnceCell::new();
}

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads config + sprite and starts the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // wasm is single threaded, the loop runs as a local task
    browser::spawn_local(async move {
        match GameLoop::start(DinoRun::new()).await {
            Ok(handle) => RUNNING_LOOP.with(|running| {
                if running.set(handle).is_err() {
                    error!("Game loop was already running");
                }
            }),
            Err(err) => error!("Could not start game loop : {:#?}", err),
        }
    });

    Ok(())
}

/// Stops scheduling frames. The last frame drawn stays on the canvas.
#[wasm_bindgen]
pub fn stop_game() {
    RUNNING_LOOP.with(|running| {
        if let Some(handle) = running.get() {
            handle.stop();
        }
    });
}
