//! CLI command implementations

pub mod config;
pub mod download;
pub mod key;
pub mod status;
mod target;
pub mod upload;

pub use config::execute as config;
pub use download::execute as download;
pub use key::execute as key;
pub use status::execute as status;
pub use upload::execute as upload;
