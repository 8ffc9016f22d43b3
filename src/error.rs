//! Crate error type

use std::time::Duration;

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by the world, configuration loading and the simulation drivers
#[derive(Error, Debug)]
pub enum Error {
    /// A node cannot be connected to itself
    #[error("cannot connect node {0} to itself")]
    SelfConnection(NodeId),

    /// The pair already shares an edge
    #[error("nodes {0} and {1} are already connected")]
    AlreadyConnected(NodeId, NodeId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed or serialized
    #[error("configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Drivers did not finish within the shutdown timeout
    #[error("drivers did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// A driver task panicked or was cancelled
    #[error("driver failed: {0}")]
    DriverFailed(String),
}

/// Result type for fallible crate operations
pub type Result<T> = std::result::Result<T, Error>;
