//! Typed request and response bodies for the HuaweiCloud REST APIs
//!
//! Each submodule mirrors one API's JSON shapes and exposes thin async
//! functions over a [`ServiceClient`](crate::client::ServiceClient).

pub mod cce;
pub mod dms;
pub mod tags;
pub mod vpc;
