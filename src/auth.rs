//! Auth-domain identifiers, claim sets, and token models.

pub mod claims;
pub mod id;
pub mod token;

pub use claims::*;
pub use id::*;
pub use token::{TokenKind, pair::*, payload::*, secret::*};
