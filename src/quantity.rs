#[macro_use]
mod macros;

pub mod percent;
pub mod power;
