pub mod root;
pub mod containment;
pub mod write;

pub use root::RootSource;
pub use containment::is_under_root;
pub use write::dispatch_write;
