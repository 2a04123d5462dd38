//! Imports the [`Routes`](crate::Routes) registration trait.

pub use crate::router::Routes;
