pub mod chunk;
pub mod frame;
pub mod gemini;
pub mod http;

pub use chunk::*;
pub use frame::*;
pub use http::*;
