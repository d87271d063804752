pub mod direction;
pub mod synthesis;
