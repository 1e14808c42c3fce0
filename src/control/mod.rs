pub mod catalog;
pub mod service;

pub use service::{ContainerView, ControlService};
