pub mod errors;
pub mod expenses;
