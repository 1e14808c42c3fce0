pub mod engine;

pub use engine::DockerEngine;
