use wasm_bindgen::prelude::*;
use glyph_engine::*;

pub mod model;
pub mod progress;
pub mod pool;
pub mod turn;
pub mod stage;
pub mod resolver;
pub mod session;
mod game;
pub use game::NameSpeller;

glyph_web::export_game!(NameSpeller, "name-speller");
