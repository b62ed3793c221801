pub mod service;

pub use service::{CommandPublisher, LightCommand};
