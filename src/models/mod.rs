pub mod coefficients;
pub mod store;
pub mod table;
