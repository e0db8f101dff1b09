pub mod app;
pub mod logging;
pub mod output;
pub mod settings;
pub mod utils;
pub mod wizard;
