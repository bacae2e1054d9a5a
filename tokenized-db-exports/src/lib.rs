mod constants;
mod controller;
mod error;
mod settings;

pub use constants::*;
pub use controller::*;
pub use error::*;
pub use settings::*;
