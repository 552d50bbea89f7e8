pub mod cache;
pub mod context;
pub mod credentials;
pub mod duration;
pub mod env;
pub mod error;
pub mod identifier;
pub mod ini;
pub mod invalidation;
pub mod io;
pub mod pager;
pub mod paths;
pub mod profile;
pub mod secret;
pub mod transport;

pub use error::{ErrorKind, LnrError, Result};
