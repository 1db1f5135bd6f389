pub mod analysis;
pub mod comments;
pub mod locator;
pub mod storage;
pub mod summary;
pub mod tools;
pub mod transcript;
pub mod youtube;

pub use comments::*;
pub use locator::*;
pub use storage::*;
pub use summary::*;
pub use tools::*;
pub use transcript::*;
pub use youtube::*;
