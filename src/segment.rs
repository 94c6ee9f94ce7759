use std::fmt::Debug;

use itertools::Itertools;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::RouteError;
use crate::graph::{GeoNode, RoadEdge};
use crate::risk::{classify, HazardReason, RandomSource, RiskTier};
use crate::visibility::VisibilityEstimator;

/// What the segmenter needs from a road graph.
pub trait RoadNetwork {
    type NodeId: Copy + Debug;

    fn coordinate(&self, node: Self::NodeId) -> Option<GeoNode>;

    fn edge(&self, from: Self::NodeId, to: Self::NodeId) -> Option<&RoadEdge>;
}

/// One classified road piece of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// `[lat, lon]` pairs.
    pub positions: Vec<[f64; 2]>,
    pub color: &'static str,
    pub risk: RiskTier,
    #[serde(rename = "info", serialize_with = "join_reasons")]
    pub reasons: Vec<HazardReason>,
}

fn join_reasons<S: Serializer>(reasons: &[HazardReason], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&reasons.iter().join(", "))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TierCounts {
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::High => self.high += 1,
            RiskTier::Moderate => self.moderate += 1,
            RiskTier::Low => self.low += 1,
        }
    }

    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Moderate => self.moderate,
            RiskTier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.moderate + self.low
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HazardCounts {
    #[serde(rename = "Sharp Curve")]
    pub sharp_curve: usize,
    #[serde(rename = "Poor Lighting")]
    pub poor_lighting: usize,
    #[serde(rename = "Narrow Road")]
    pub narrow_road: usize,
    #[serde(rename = "Traffic Congestion")]
    pub traffic_congestion: usize,
    #[serde(rename = "Bad Visibility")]
    pub bad_visibility: usize,
    #[serde(rename = "Known Blackspot")]
    pub known_blackspot: usize,
    #[serde(rename = "High Speed Zone")]
    pub high_speed_zone: usize,
    #[serde(rename = "Winding Road")]
    pub winding_road: usize,
}

impl HazardCounts {
    fn slot(&mut self, reason: HazardReason) -> Option<&mut usize> {
        match reason {
            HazardReason::SharpCurve => Some(&mut self.sharp_curve),
            HazardReason::PoorLighting => Some(&mut self.poor_lighting),
            HazardReason::NarrowRoad => Some(&mut self.narrow_road),
            HazardReason::TrafficCongestion => Some(&mut self.traffic_congestion),
            HazardReason::BadVisibility => Some(&mut self.bad_visibility),
            HazardReason::KnownBlackspot => Some(&mut self.known_blackspot),
            HazardReason::HighSpeedZone => Some(&mut self.high_speed_zone),
            HazardReason::WindingRoad => Some(&mut self.winding_road),
            HazardReason::SafeRoute => None,
        }
    }

    /// Count a reason; the "Safe Route" placeholder is ignored.
    pub fn record(&mut self, reason: HazardReason) {
        if let Some(count) = self.slot(reason) {
            *count += 1;
        }
    }

    pub fn get(&self, reason: HazardReason) -> usize {
        match reason {
            HazardReason::SharpCurve => self.sharp_curve,
            HazardReason::PoorLighting => self.poor_lighting,
            HazardReason::NarrowRoad => self.narrow_road,
            HazardReason::TrafficCongestion => self.traffic_congestion,
            HazardReason::BadVisibility => self.bad_visibility,
            HazardReason::KnownBlackspot => self.known_blackspot,
            HazardReason::HighSpeedZone => self.high_speed_zone,
            HazardReason::WindingRoad => self.winding_road,
            HazardReason::SafeRoute => 0,
        }
    }

    pub fn total(&self) -> usize {
        HazardReason::HAZARDS.iter().map(|&r| self.get(r)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub segments: Vec<Segment>,
    pub stats: TierCounts,
    pub hazards: HazardCounts,
    #[serde(rename = "distance")]
    pub total_distance_km: f64,
}

fn round_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}

/// Classify every step of `path` against `network`.
///
/// `path_length_m` is the router's own total; it is only converted, not
/// recomputed. A step without an edge aborts the whole route.
pub fn compute_route_summary<N, D>(
    network: &N,
    path: &[N::NodeId],
    path_length_m: f64,
    visibility_penalty: u32,
    draws: &mut D,
) -> Result<RouteSummary, RouteError>
where
    N: RoadNetwork,
    D: RandomSource + ?Sized,
{
    let mut segments = Vec::with_capacity(path.len().saturating_sub(1));
    let mut stats = TierCounts::default();
    let mut hazards = HazardCounts::default();

    for (&u, &v) in path.iter().tuple_windows() {
        let edge = network.edge(u, v).ok_or_else(|| RouteError::MissingEdge {
            from: format!("{u:?}"),
            to: format!("{v:?}"),
        })?;

        let positions = match &edge.geometry {
            Some(line) => line.coords().map(|c| [c.y, c.x]).collect(),
            None => {
                let a = network.coordinate(u).ok_or_else(|| RouteError::UnknownNode(format!("{u:?}")))?;
                let b = network.coordinate(v).ok_or_else(|| RouteError::UnknownNode(format!("{v:?}")))?;
                vec![[a.lat, a.lon], [b.lat, b.lon]]
            }
        };

        let assessment = classify(edge, visibility_penalty, draws);
        stats.record(assessment.tier);
        for &reason in assessment.reasons.iter().filter(|r| r.is_hazard()) {
            hazards.record(reason);
        }
        segments.push(Segment {
            positions,
            color: assessment.color(),
            risk: assessment.tier,
            reasons: assessment.reasons,
        });
    }

    let summary = RouteSummary {
        segments,
        stats,
        hazards,
        total_distance_km: round_km(path_length_m),
    };
    debug!(
        segments = summary.segments.len(),
        high = summary.stats.high,
        moderate = summary.stats.moderate,
        low = summary.stats.low,
        hazards = summary.hazards.total(),
        km = summary.total_distance_km,
        "route segmented"
    );
    Ok(summary)
}

/// Estimate visibility once, then segment the whole route with it.
pub fn segment_route<N, D>(
    network: &N,
    path: &[N::NodeId],
    path_length_m: f64,
    visibility: &VisibilityEstimator,
    draws: &mut D,
) -> Result<RouteSummary, RouteError>
where
    N: RoadNetwork,
    D: RandomSource + ?Sized,
{
    let penalty = visibility.penalty();
    compute_route_summary(network, path, path_length_m, penalty, draws)
}
