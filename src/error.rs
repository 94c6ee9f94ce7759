use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("no road node near the requested point")]
    NodeNotFound,

    #[error("no road path between the requested points")]
    NoPath,

    /// The router promised an edge the graph does not have.
    #[error("route step {from} -> {to} has no edge in the graph")]
    MissingEdge { from: String, to: String },

    #[error("node {0} is not in the graph")]
    UnknownNode(String),
}

impl RouteError {
    /// Errors caused by what the caller asked for, as opposed to broken
    /// invariants between the router and the graph.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidCoordinates(_) | RouteError::NodeNotFound | RouteError::NoPath
        )
    }
}
