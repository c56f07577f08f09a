mod device_rx;
mod error_model;
mod rng;
mod sim_time;
mod support;
