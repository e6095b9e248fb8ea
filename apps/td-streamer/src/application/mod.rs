//! Application Layer - Port definitions.
//!
//! The protocol core talks to the outside world only through the traits
//! declared here.

/// Port interfaces for id generation and the transport.
pub mod ports;
