//! C ABI for the cyberfire simulator.
//!
//! Every function returns a [`CyberFireErrorCode`]; the matching message is available
//! from [`cyberfire_get_last_error`] on the same thread. Instances are opaque heap
//! pointers created by `*_new` and released by `*_destroy`.

mod error;
pub mod fire2d;
pub mod fire3d;
mod helpers;

pub use error::{cyberfire_get_last_error, cyberfire_get_last_error_code, CyberFireErrorCode};
