use std::collections::HashMap;
use std::path::Path;

use geo::prelude::*;
use geo::{Coord, LineString, Point};
use itertools::Itertools;
use osmpbf::{Element, ElementReader};
use petgraph::algo::astar;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::{EdgeRef, NodeFiltered};
use rstar::RTree;
use rstar::primitives::GeomWithData;
use tracing::{debug, info, warn};

use crate::error::RouteError;
use crate::segment::RoadNetwork;
use crate::tags::TagValue;

// flat-earth scale used when sizing the search window
const METERS_PER_DEGREE: f64 = 111_000.0;
const RADIUS_MARGIN_M: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoNode {
    pub lat: f64,
    pub lon: f64,
}

impl GeoNode {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    pub fn distance_m(self, other: GeoNode) -> f64 {
        self.point().haversine_distance(&other.point())
    }
}

/// A drivable road piece between two intersections.
///
/// `geometry` is stored as (x = lon, y = lat), oriented from source to
/// target, and is only present when the piece has intermediate points.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub geometry: Option<LineString<f64>>,
    pub lanes: Option<TagValue>,
    pub highway: Option<TagValue>,
    pub length_m: f64,
}

impl RoadEdge {
    fn reversed(&self) -> Self {
        let geometry = self.geometry.as_ref().map(|g| {
            let mut coords = g.0.clone();
            coords.reverse();
            LineString::new(coords)
        });
        Self { geometry, ..self.clone() }
    }
}

/// Result of a shortest-path query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub path: Vec<NodeIndex>,
    pub length_m: f64,
}

type NodeEntry = GeomWithData<[f64; 2], NodeIndex>;

pub struct NavigationGraph {
    pub graph: Graph<GeoNode, RoadEdge>,
    index: RTree<NodeEntry>,
}

fn is_drivable(highway: &str) -> bool {
    let base = highway.strip_suffix("_link").unwrap_or(highway);
    matches!(
        base,
        "motorway" | "trunk" | "primary" | "secondary" | "tertiary" | "unclassified"
            | "residential" | "service" | "living_street" | "track"
    )
}

enum Direction {
    Both,
    Forward,
    Backward,
}

fn direction(tags: &HashMap<&str, &str>) -> Direction {
    if tags.get("junction").copied() == Some("roundabout") {
        return Direction::Forward;
    }
    match tags.get("oneway").copied().unwrap_or("") {
        "yes" | "true" | "1" => Direction::Forward,
        "-1" | "reverse" => Direction::Backward,
        _ => Direction::Both,
    }
}

/// Indices at which a way is cut into edges: both ends plus every node that
/// another drivable way also uses.
fn split_points(refs: &[i64], usage: &HashMap<i64, u32>) -> Vec<usize> {
    let Some(last) = refs.len().checked_sub(1) else {
        return Vec::new();
    };
    (0..=last)
        .filter(|&i| i == 0 || i == last || usage.get(&refs[i]).copied().unwrap_or(0) > 1)
        .collect()
}

/// One edge between two split points of a way, in way order.
#[derive(Debug)]
struct RoadPiece {
    from: i64,
    to: i64,
    start: GeoNode,
    end: GeoNode,
    edge: RoadEdge,
}

/// Cut a way into edges. Nodes without known coordinates are dropped first.
fn road_pieces(
    refs: &[i64],
    coords: &HashMap<i64, (f64, f64)>,
    usage: &HashMap<i64, u32>,
    lanes: Option<&TagValue>,
    highway: &TagValue,
) -> Vec<RoadPiece> {
    let refs: Vec<i64> = refs.iter().copied().filter(|id| coords.contains_key(id)).collect();
    if refs.len() < 2 {
        return Vec::new();
    }

    split_points(&refs, usage)
        .into_iter()
        .tuple_windows()
        .map(|(a, b)| {
            let piece: Vec<GeoNode> = refs[a..=b]
                .iter()
                .map(|id| {
                    let (lat, lon) = coords[id];
                    GeoNode::new(lat, lon)
                })
                .collect();
            let length_m: f64 = piece.iter().tuple_windows().map(|(p, q)| p.distance_m(*q)).sum();
            let geometry = (piece.len() >= 3).then(|| {
                piece.iter().map(|n| Coord { x: n.lon, y: n.lat }).collect::<LineString<f64>>()
            });
            RoadPiece {
                from: refs[a],
                to: refs[b],
                start: piece[0],
                end: piece[piece.len() - 1],
                edge: RoadEdge {
                    geometry,
                    lanes: lanes.cloned(),
                    highway: Some(highway.clone()),
                    length_m,
                },
            }
        })
        .collect()
}

impl NavigationGraph {
    /// Wrap an already-built graph, indexing its nodes for nearest lookups.
    pub fn from_graph(graph: Graph<GeoNode, RoadEdge>) -> Self {
        let entries = graph
            .node_indices()
            .map(|idx| {
                let n = graph[idx];
                GeomWithData::new([n.lon, n.lat], idx)
            })
            .collect();
        Self { graph, index: RTree::bulk_load(entries) }
    }

    pub fn from_pbf(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "parsing OSM PBF");

        // PASS 1: node coordinates
        let mut coords: HashMap<i64, (f64, f64)> = HashMap::new();
        ElementReader::from_path(path)?.for_each(|element| match element {
            Element::Node(node) => {
                coords.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::DenseNode(node) => {
                coords.insert(node.id(), (node.lat(), node.lon()));
            }
            _ => {}
        })?;
        info!(nodes = coords.len(), "loaded nodes, counting way references");

        // PASS 2: how many drivable ways touch each node
        let mut usage: HashMap<i64, u32> = HashMap::new();
        ElementReader::from_path(path)?.for_each(|element| {
            if let Element::Way(way) = element {
                let drivable = way.tags().any(|(k, v)| k == "highway" && is_drivable(v));
                if drivable {
                    for id in way.refs() {
                        *usage.entry(id).or_insert(0) += 1;
                    }
                }
            }
        })?;

        // PASS 3: split ways at intersections into edges
        let mut graph = Graph::new();
        let mut osm_id_map: HashMap<i64, NodeIndex> = HashMap::new();
        ElementReader::from_path(path)?.for_each(|element| {
            let Element::Way(way) = element else {
                return;
            };
            let tags: HashMap<&str, &str> = way.tags().collect();
            let highway = tags.get("highway").copied().unwrap_or("");
            if !is_drivable(highway) {
                return;
            }
            let lanes = tags.get("lanes").map(|v| TagValue::parse(v));
            let highway_tag = TagValue::parse(highway);
            let dir = direction(&tags);

            let refs: Vec<i64> = way.refs().collect();
            for piece in road_pieces(&refs, &coords, &usage, lanes.as_ref(), &highway_tag) {
                let idx_a = *osm_id_map
                    .entry(piece.from)
                    .or_insert_with(|| graph.add_node(piece.start));
                let idx_b = *osm_id_map
                    .entry(piece.to)
                    .or_insert_with(|| graph.add_node(piece.end));

                match dir {
                    Direction::Both => {
                        graph.add_edge(idx_b, idx_a, piece.edge.reversed());
                        graph.add_edge(idx_a, idx_b, piece.edge);
                    }
                    Direction::Forward => {
                        graph.add_edge(idx_a, idx_b, piece.edge);
                    }
                    Direction::Backward => {
                        graph.add_edge(idx_b, idx_a, piece.edge.reversed());
                    }
                }
            }
        })?;

        info!(nodes = graph.node_count(), edges = graph.edge_count(), "graph built");
        Ok(Self::from_graph(graph))
    }

    pub fn node(&self, idx: NodeIndex) -> Option<GeoNode> {
        self.graph.node_weight(idx).copied()
    }

    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<NodeIndex> {
        self.index.nearest_neighbor(&[lon, lat]).map(|entry| entry.data)
    }

    /// Nearest node that also lies inside the search window.
    fn nearest_within(&self, target: GeoNode, center: GeoNode, radius_m: f64) -> Option<NodeIndex> {
        self.index
            .nearest_neighbor_iter(&[target.lon, target.lat])
            .map(|entry| entry.data)
            .find(|&idx| self.graph[idx].distance_m(center) <= radius_m)
    }

    /// Shortest path by length from `origin` to `destination`, using only
    /// nodes within `radius_m` of `center`.
    pub fn shortest_path(
        &self,
        origin: NodeIndex,
        destination: NodeIndex,
        center: GeoNode,
        radius_m: f64,
    ) -> Result<PlannedRoute, RouteError> {
        let g = &self.graph;
        let dest = *g.node_weight(destination).ok_or_else(|| RouteError::UnknownNode(destination.index().to_string()))?;
        if g.node_weight(origin).is_none() {
            return Err(RouteError::UnknownNode(origin.index().to_string()));
        }
        let window = NodeFiltered::from_fn(g, |n: NodeIndex| g[n].distance_m(center) <= radius_m);

        astar(
            &window,
            origin,
            |n| n == destination,
            |e| e.weight().length_m,
            |n| g[n].distance_m(dest),
        )
        .map(|(length_m, path)| PlannedRoute { path, length_m })
        .ok_or(RouteError::NoPath)
    }

    /// Snap both endpoints and find the shortest path between them inside a
    /// window sized to the trip, capped at `max_radius_m`.
    pub fn plan(&self, start: GeoNode, end: GeoNode, max_radius_m: f64) -> Result<PlannedRoute, RouteError> {
        let radius = search_radius(start, end, max_radius_m);
        let center = GeoNode::new((start.lat + end.lat) / 2.0, (start.lon + end.lon) / 2.0);
        debug!(radius, ?center, "planning route");

        let origin = self.nearest_within(start, center, radius).ok_or(RouteError::NodeNotFound)?;
        let destination = self.nearest_within(end, center, radius).ok_or(RouteError::NodeNotFound)?;
        self.shortest_path(origin, destination, center, radius)
    }
}

/// Half the straight-line trip plus a margin, capped at `max_radius_m`.
pub fn search_radius(start: GeoNode, end: GeoNode, max_radius_m: f64) -> f64 {
    let d_lat = (start.lat - end.lat).abs() * METERS_PER_DEGREE;
    let d_lon = (start.lon - end.lon).abs() * METERS_PER_DEGREE;
    let radius = d_lat.hypot(d_lon) / 2.0 + RADIUS_MARGIN_M;
    if radius > max_radius_m {
        warn!(radius, max_radius_m, "search radius clamped");
        max_radius_m
    } else {
        radius
    }
}

impl RoadNetwork for NavigationGraph {
    type NodeId = NodeIndex;

    fn coordinate(&self, node: NodeIndex) -> Option<GeoNode> {
        self.node(node)
    }

    /// The shortest of any parallel edges, matching what the router used.
    fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&RoadEdge> {
        self.graph
            .edges_connecting(from, to)
            .map(|e| e.weight())
            .min_by(|a, b| a.length_m.total_cmp(&b.length_m))
    }
}
