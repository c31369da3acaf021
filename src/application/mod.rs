//! Application layer orchestrating a payment validation request.
//!
//! `ValidationHandler` ties the collaborators together: authentication,
//! the reservation store, the pure payment rules and the response view.

pub mod validation;
