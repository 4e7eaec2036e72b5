//! Core data models shared by the server and the console client.
//!
//! Everything here serializes as camelCase JSON, which is the wire format of
//! the REST façade.

pub mod bucket;
pub mod connection;
pub mod object;
pub mod policy;
