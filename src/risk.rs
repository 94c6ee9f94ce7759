use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use serde::{Serialize, Serializer};

use crate::curvature::curvature;
use crate::graph::RoadEdge;
use crate::tags::TagValue;

const DEFAULT_LANES: &str = "2";

/// Three-level risk classification of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn from_score(score: u32) -> Self {
        if score > 50 {
            RiskTier::High
        } else if score > 20 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Display color used by the map client.
    pub fn color(self) -> &'static str {
        match self {
            RiskTier::Low => "#20BD5F",
            RiskTier::Moderate => "#F5A623",
            RiskTier::High => "#E11B23",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardReason {
    SharpCurve,
    PoorLighting,
    NarrowRoad,
    TrafficCongestion,
    BadVisibility,
    KnownBlackspot,
    HighSpeedZone,
    WindingRoad,
    /// Placeholder for a clean Low segment; never counted as a hazard.
    SafeRoute,
}

impl HazardReason {
    /// Every reason that is tallied in a route's hazard counts.
    pub const HAZARDS: [HazardReason; 8] = [
        HazardReason::SharpCurve,
        HazardReason::PoorLighting,
        HazardReason::NarrowRoad,
        HazardReason::TrafficCongestion,
        HazardReason::BadVisibility,
        HazardReason::KnownBlackspot,
        HazardReason::HighSpeedZone,
        HazardReason::WindingRoad,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HazardReason::SharpCurve => "Sharp Curve",
            HazardReason::PoorLighting => "Poor Lighting",
            HazardReason::NarrowRoad => "Narrow Road",
            HazardReason::TrafficCongestion => "Traffic Congestion",
            HazardReason::BadVisibility => "Bad Visibility",
            HazardReason::KnownBlackspot => "Known Blackspot",
            HazardReason::HighSpeedZone => "High Speed Zone",
            HazardReason::WindingRoad => "Winding Road",
            HazardReason::SafeRoute => "Safe Route",
        }
    }

    pub fn is_hazard(self) -> bool {
        self != HazardReason::SafeRoute
    }
}

impl fmt::Display for HazardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for HazardReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Uniform draws in `[0, 1)` for the flavor heuristics.
pub trait RandomSource {
    fn draw(&mut self) -> f64;
}

/// Production source backed by a `rand` generator.
pub struct RngDraws<R>(pub R);

impl<R: Rng> RandomSource for RngDraws<R> {
    fn draw(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Replays a fixed sequence, then keeps returning 0.0 (which never triggers
/// a heuristic).
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    values: VecDeque<f64>,
}

impl ScriptedDraws {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self { values: values.into_iter().collect() }
    }

    /// A source whose draws never trigger anything.
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedDraws {
    fn draw(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub score: u32,
    pub reasons: Vec<HazardReason>,
}

impl RiskAssessment {
    pub fn color(&self) -> &'static str {
        self.tier.color()
    }
}

/// Score one edge.
///
/// Factors are additive: curvature, lane count, the blackspot heuristic
/// (only once the score already exceeds 20), road class, then visibility.
/// Tags that fail to parse simply contribute nothing.
pub fn classify<D: RandomSource + ?Sized>(
    edge: &RoadEdge,
    visibility_penalty: u32,
    draws: &mut D,
) -> RiskAssessment {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    let curve = curvature(edge.geometry.as_ref());
    if curve > 45.0 {
        score += 30;
        reasons.push(HazardReason::SharpCurve);
    } else if curve > 20.0 {
        score += 10;
        reasons.push(HazardReason::WindingRoad);
    }

    let lanes = TagValue::first_or(edge.lanes.as_ref(), DEFAULT_LANES);
    if let Ok(n) = lanes.trim().parse::<i64>() {
        if n <= 1 {
            score += 20;
            reasons.push(HazardReason::NarrowRoad);
            if draws.draw() > 0.7 {
                reasons.push(HazardReason::TrafficCongestion);
            }
        }
    }

    if score > 20 && draws.draw() > 0.8 {
        score += 40;
        reasons.push(HazardReason::KnownBlackspot);
    }

    match TagValue::first_or(edge.highway.as_ref(), "") {
        "trunk" | "primary" | "motorway" => {
            score += 10;
            reasons.push(HazardReason::HighSpeedZone);
        }
        "track" | "unclassified" | "service" => {
            score += 15;
            reasons.push(HazardReason::PoorLighting);
        }
        _ => {}
    }

    if visibility_penalty > 0 {
        score += visibility_penalty;
        reasons.push(HazardReason::BadVisibility);
    }

    let tier = RiskTier::from_score(score);
    if tier == RiskTier::Low && reasons.is_empty() {
        reasons.push(HazardReason::SafeRoute);
    }

    RiskAssessment { tier, score, reasons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, LineString};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn edge(lanes: Option<TagValue>, highway: Option<TagValue>, geometry: Option<LineString<f64>>) -> RoadEdge {
        RoadEdge { geometry, lanes, highway, length_m: 100.0 }
    }

    // 90 degree elbow: curvature 90
    fn sharp() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 0.001, y: 0.0), (x: 0.001, y: 0.001)]
    }

    // two 15 degree bends: curvature 30
    fn winding() -> LineString<f64> {
        let a = 15f64.to_radians();
        line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0 + a.cos(), y: a.sin()),
            (x: 1.0 + a.cos() + (2.0 * a).cos(), y: a.sin() + (2.0 * a).sin()),
        ]
    }

    #[test]
    fn tier_boundaries_are_strict() {
        assert_eq!(RiskTier::from_score(20), RiskTier::Low);
        assert_eq!(RiskTier::from_score(21), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(50), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(51), RiskTier::High);
        assert!(RiskTier::Low < RiskTier::Moderate && RiskTier::Moderate < RiskTier::High);
    }

    #[test]
    fn plain_edge_is_safe_route() {
        let a = classify(&edge(None, None, None), 0, &mut ScriptedDraws::quiet());
        assert_eq!(a.score, 0);
        assert_eq!(a.tier, RiskTier::Low);
        assert_eq!(a.color(), "#20BD5F");
        assert_eq!(a.reasons, vec![HazardReason::SafeRoute]);
    }

    #[test]
    fn high_speed_road_alone_stays_low() {
        for hw in ["trunk", "primary", "motorway"] {
            let a = classify(&edge(Some("3".into()), Some(hw.into()), None), 0, &mut ScriptedDraws::quiet());
            assert_eq!(a.score, 10);
            assert_eq!(a.tier, RiskTier::Low);
            assert_eq!(a.reasons, vec![HazardReason::HighSpeedZone]);
        }
    }

    #[test]
    fn narrow_motorway_is_moderate() {
        let mut draws = ScriptedDraws::quiet();
        let a = classify(&edge(Some("1".into()), Some("motorway".into()), None), 0, &mut draws);
        assert_eq!(a.score, 30);
        assert_eq!(a.tier, RiskTier::Moderate);
        assert_eq!(a.color(), "#F5A623");
        assert_eq!(a.reasons, vec![HazardReason::NarrowRoad, HazardReason::HighSpeedZone]);
    }

    #[test]
    fn sharp_curve_with_bad_visibility_sits_on_boundary() {
        let e = edge(Some("4".into()), Some("residential".into()), Some(sharp()));
        let a = classify(&e, 20, &mut ScriptedDraws::quiet());
        assert_eq!(a.score, 50);
        assert_eq!(a.tier, RiskTier::Moderate);
        assert_eq!(a.reasons, vec![HazardReason::SharpCurve, HazardReason::BadVisibility]);
    }

    #[test]
    fn winding_road_and_poor_lighting() {
        let e = edge(None, Some(TagValue::from(vec!["service", "primary"])), Some(winding()));
        let a = classify(&e, 0, &mut ScriptedDraws::quiet());
        assert_eq!(a.score, 25);
        assert_eq!(a.tier, RiskTier::Moderate);
        assert_eq!(a.reasons, vec![HazardReason::WindingRoad, HazardReason::PoorLighting]);
    }

    #[test]
    fn congestion_is_flavor_only() {
        let mut draws = ScriptedDraws::new([0.95, 0.0]);
        let a = classify(&edge(Some("1".into()), None, None), 0, &mut draws);
        assert_eq!(a.score, 20);
        assert_eq!(a.tier, RiskTier::Low);
        assert_eq!(a.reasons, vec![HazardReason::NarrowRoad, HazardReason::TrafficCongestion]);
    }

    #[test]
    fn blackspot_needs_score_above_twenty() {
        // score 20 after lanes: no blackspot draw is taken
        let mut draws = ScriptedDraws::new([0.0, 0.99]);
        let a = classify(&edge(Some("1".into()), None, None), 0, &mut draws);
        assert!(!a.reasons.contains(&HazardReason::KnownBlackspot));
        assert_eq!(draws.remaining(), 1);

        // sharp curve + narrow: 50, then blackspot pushes to 90
        let mut draws = ScriptedDraws::new([0.0, 0.81]);
        let a = classify(&edge(Some("1".into()), None, Some(sharp())), 0, &mut draws);
        assert_eq!(a.score, 90);
        assert_eq!(a.tier, RiskTier::High);
        assert_eq!(a.color(), "#E11B23");
        assert_eq!(
            a.reasons,
            vec![HazardReason::SharpCurve, HazardReason::NarrowRoad, HazardReason::KnownBlackspot]
        );
    }

    #[test]
    fn unparsable_lanes_are_ignored() {
        for lanes in ["two", "", "1.5"] {
            let a = classify(&edge(Some(lanes.into()), None, None), 0, &mut ScriptedDraws::quiet());
            assert_eq!(a.score, 0);
            assert_eq!(a.reasons, vec![HazardReason::SafeRoute]);
        }
        let list = TagValue::from(vec!["1", "3"]);
        let a = classify(&edge(Some(list), None, None), 0, &mut ScriptedDraws::quiet());
        assert_eq!(a.reasons, vec![HazardReason::NarrowRoad]);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let e = edge(Some("1".into()), Some("service".into()), Some(sharp()));
        let a = classify(&e, 10, &mut RngDraws(StdRng::seed_from_u64(7)));
        let b = classify(&e, 10, &mut RngDraws(StdRng::seed_from_u64(7)));
        assert_eq!(a, b);
    }

    #[test]
    fn thread_rng_draws_stay_in_unit_interval() {
        let mut draws = RngDraws(rand::rng());
        for _ in 0..1000 {
            let d = draws.draw();
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn only_safe_route_is_not_a_hazard() {
        assert!(HazardReason::HAZARDS.iter().all(|r| r.is_hazard()));
        assert!(!HazardReason::SafeRoute.is_hazard());
    }
}
