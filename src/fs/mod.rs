//! FileSystem abstraction for testable artifact and marker operations

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{FileSystem, FileType};
pub use real::RealFileSystem;
