//! Request handlers.

pub mod assets;
pub mod files;
pub mod health;
pub mod render;
pub mod storyboard;

pub use assets::*;
pub use files::*;
pub use health::*;
pub use render::*;
pub use storyboard::*;
