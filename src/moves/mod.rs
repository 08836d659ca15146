pub mod attacks;
pub mod execute;
pub mod legal;
pub mod movegen;
pub mod perft;
pub mod types;

pub use types::{Move, MoveBuffer, Undo};
