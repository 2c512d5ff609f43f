pub mod layered;
pub mod static_source;

pub use layered::LayeredValueSource;
pub use static_source::StaticValueSource;
