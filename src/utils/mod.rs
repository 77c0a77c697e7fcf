pub mod token;
pub mod constants;
pub mod config_loader;
pub mod registry;

pub use token::{TokenAsset, TokenAssetWrapper};
pub use constants::*;
pub use config_loader::*;
pub use registry::TokenRegistry;
