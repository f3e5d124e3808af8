pub mod alloc;
pub mod holdings;
pub mod rate;
pub mod refresh;
pub mod setup;
pub mod stats;
pub mod ui;
