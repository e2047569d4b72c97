pub mod push;
pub mod weather;
