//! Ports (hexagonal architecture): what the client needs from the outside
//! world, and what the outside world drives.

pub mod inbound;
pub mod outbound;

pub use inbound::InvalidationHandler;
pub use outbound::{
    HttpMethod, RequestTarget, StateTransport, SystemTimeSource, TimeSource, TransportRequest,
    TransportResponse,
};
