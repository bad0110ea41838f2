pub mod bookings;
pub mod derivation;
pub mod payments;
pub mod rooms;
