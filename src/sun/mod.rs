pub mod compass;
pub mod position;
