pub mod echo;
pub mod net;
pub mod reflector;
pub mod signal;
