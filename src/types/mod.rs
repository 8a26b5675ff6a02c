//! Value types for light control parameters.

mod brightness;
mod color;
mod kelvin;
mod power;

pub use brightness::Brightness;
pub use color::Color;
pub use kelvin::{Kelvin, KelvinRange};
pub use power::PowerMode;
