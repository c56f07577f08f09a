pub mod error;
pub mod error_model;
pub mod net;
pub mod propagation;
pub mod queue;
pub mod rng;
pub mod sim;
pub mod topo;
pub mod trace;

#[cfg(test)]
mod test;
