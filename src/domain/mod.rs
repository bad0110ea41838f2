pub mod booking;
pub mod payment;
pub mod ports;
pub mod reference;
pub mod room;
