pub mod error;
pub mod mime;
pub mod sheet;
pub mod slides;
pub mod validation;
