//! Reservation payment model and the pure rules that move it between states.

pub mod audit;
pub mod payment;
pub mod ports;
pub mod reservation;
