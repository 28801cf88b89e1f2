//! Cart Store
//!
//! Guest carts live in client storage as a JSON snapshot; authenticated carts
//! live on the server and are only ever observed through the server's own
//! response. The merge coordinator moves the former into the latter on login.

mod errors;
mod guest;
mod merge;
mod server;

pub use errors::*;
pub use guest::*;
pub use merge::*;
pub use server::*;
