pub mod models;

pub use models::{ChatSpace, Stream};
