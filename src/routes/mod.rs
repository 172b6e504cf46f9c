pub mod admin;
pub mod bookings;
pub mod customers;
pub mod public;
pub mod services;
