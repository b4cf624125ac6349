//! Interface layer - observer surfaces

pub mod observer;

pub use observer::TracingObserver;
