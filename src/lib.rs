pub mod config;
pub mod events;
pub mod playlist;
pub mod signal;
pub mod tasks {
    pub mod files;
    pub mod loader;
    pub mod scheduler;
    pub mod viewer;
}
