pub mod bitboard;
pub mod position;
pub mod types;

pub use bitboard::*;
pub use position::*;
pub use types::*;
