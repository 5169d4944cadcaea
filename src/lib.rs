pub mod caption;
pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod frames;
pub mod page;
pub mod progress;
pub mod region;
pub mod scroll;
pub mod tracker;
pub mod processing {
    pub mod canvas;
    pub mod layout;
}
pub mod tasks {
    pub mod loader;
    pub mod renderer;
    pub mod viewer;
}
