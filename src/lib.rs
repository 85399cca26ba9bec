// Module declarations
pub mod auto;
pub mod cards;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod gemini;
pub mod generations;
pub mod sandbox;
pub mod selection;
pub mod utils;

pub use auto::AutoPlayer;
pub use error::AppError;
pub use sandbox::Sandbox;
pub use selection::Selection;
