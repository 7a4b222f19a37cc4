pub mod attrs;
pub mod constants;
pub mod error;
pub mod header;
pub mod packet;
pub mod util;
