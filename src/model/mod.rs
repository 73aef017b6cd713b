pub mod datasource;
pub mod persistence;
pub mod recording;

pub use datasource::*;
pub use recording::*;
