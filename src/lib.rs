pub mod components;

pub mod field;

pub mod host;

pub mod panel;

pub mod registry;

pub mod theme;

mod utils;
pub use utils::ElementIdExt;

mod init;
pub use init::*;
