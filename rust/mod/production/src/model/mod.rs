mod assignment;
mod audit;
mod beam;
mod factory;
mod production;
mod worker;

pub use assignment::*;
pub use audit::*;
pub use beam::*;
pub use factory::*;
pub use production::*;
pub use worker::*;
