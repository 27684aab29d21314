pub mod catalog;
pub mod proto;
pub mod text;
pub mod types;
