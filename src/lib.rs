pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod particles;
pub mod processing {
    pub mod color;
    pub mod layout;
    pub mod resample;
}
pub mod scan;
pub mod tasks {
    pub mod frame_loop;
    pub mod loader;
}
pub mod transition;

pub use controller::{Controller, Snapshot};
pub use error::Error;
