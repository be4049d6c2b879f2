//! CasPer networks, which grow one hidden unit at a
//! time while they train, and the loop that trains them.
mod casper;
mod linear;
mod rprop;
mod training;

pub use casper::{mean_squared_error, CasperConfig, CasperNetwork, Forward, Pass};
pub use rprop::GroupTarget;
pub use training::{fit, score, train, Score};
