pub mod engine;
pub mod story;

pub use engine::{Output, OutputBlock, Prompt, Reply, Session, Turn};
pub use story::{StoryError, load_story_from_file, load_story_from_str};

#[cfg(feature = "wasm")]
mod wasm_bindings {
    use super::*;
    use serde::Serialize;
    use serde_wasm_bindgen::to_value;
    use wasm_bindgen::prelude::*;

    #[derive(Serialize)]
    struct WasmTurn {
        blocks: Vec<OutputBlock>,
        prompt: Option<Prompt>,
        ended: bool,
    }

    fn turn_to_js(turn: Turn, ended: bool) -> JsValue {
        to_value(&WasmTurn {
            blocks: turn.output.blocks,
            prompt: turn.prompt,
            ended,
        })
        .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen]
    pub struct WasmSession {
        session: Session,
        started: bool,
    }

    #[wasm_bindgen]
    impl WasmSession {
        /// Create a session from a TOML story string. Call `start()` to
        /// get the opening turn.
        #[wasm_bindgen(constructor)]
        pub fn new(story_toml: &str, player_name: &str) -> Result<WasmSession, JsValue> {
            let story =
                load_story_from_str(story_toml).map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(WasmSession {
                session: Session::new(story, player_name),
                started: false,
            })
        }

        #[wasm_bindgen]
        pub fn start(&mut self) -> JsValue {
            self.started = true;
            let turn = self.session.start();
            let ended = self.session.is_ended();
            turn_to_js(turn, ended)
        }

        #[wasm_bindgen]
        pub fn choose(&mut self, index: usize) -> JsValue {
            self.step(Reply::Choice(index))
        }

        #[wasm_bindgen]
        pub fn answer(&mut self, text: &str) -> JsValue {
            self.step(Reply::Text(text.to_string()))
        }

        #[wasm_bindgen]
        pub fn confirm(&mut self, yes: bool) -> JsValue {
            self.step(if yes { Reply::Yes } else { Reply::No })
        }

        #[wasm_bindgen]
        pub fn cancel(&mut self) -> JsValue {
            self.step(Reply::Cancelled)
        }

        fn step(&mut self, reply: Reply) -> JsValue {
            if !self.started {
                return self.start();
            }
            let turn = self.session.step(reply);
            let ended = self.session.is_ended();
            turn_to_js(turn, ended)
        }
    }
}
