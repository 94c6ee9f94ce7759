//! Route risk estimation: classifies each road piece of a driving route by
//! curvature, lane count, road class and ambient visibility.

pub mod api;
pub mod config;
pub mod curvature;
pub mod error;
pub mod graph;
pub mod risk;
pub mod segment;
pub mod tags;
pub mod visibility;

pub use error::RouteError;
pub use graph::{GeoNode, NavigationGraph, RoadEdge};
pub use risk::{classify, HazardReason, RandomSource, RiskTier};
pub use segment::{compute_route_summary, segment_route, RoadNetwork, RouteSummary, Segment};
