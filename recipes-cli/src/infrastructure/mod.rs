pub mod logging;
pub mod session_store;
pub mod settings;
