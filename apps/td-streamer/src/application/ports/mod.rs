//! Application Ports (Driven)
//!
//! Interfaces the protocol core depends on:
//! - **IdGenerator**: unique request identifiers
//! - **Transport**: a bidirectional text-frame connection

mod id_generator_port;
mod transport_port;

pub use id_generator_port::IdGenerator;
pub use transport_port::{
    ConnectionEvent, ConnectionId, Transport, TransportError, TransportEvent,
};

#[cfg(test)]
pub use id_generator_port::MockIdGenerator;
#[cfg(test)]
pub use transport_port::MockTransport;
