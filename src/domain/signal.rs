// Traffic signal recommendation - ranking, default colors and manual overrides
use super::snapshot::Lane;
use super::summary::LaneTotals;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Red,
    Yellow,
    Green,
}

impl SignalStatus {
    pub fn label(self) -> &'static str {
        match self {
            SignalStatus::Red => "🔴 RED",
            SignalStatus::Yellow => "🟡 YELLOW",
            SignalStatus::Green => "🟢 GREEN",
        }
    }
}

/// The three override controls of one lane for the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneOverride {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LaneOverride {
    /// RED beats YELLOW beats GREEN when several controls fire at once.
    pub fn resolve(self) -> Option<SignalStatus> {
        if self.red {
            Some(SignalStatus::Red)
        } else if self.yellow {
            Some(SignalStatus::Yellow)
        } else if self.green {
            Some(SignalStatus::Green)
        } else {
            None
        }
    }
}

/// Override presses observed in one rendering cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideEvents {
    lanes: [LaneOverride; 4],
}

impl OverrideEvents {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn press(&mut self, lane: Lane, status: SignalStatus) {
        let controls = &mut self.lanes[lane.index()];
        match status {
            SignalStatus::Red => controls.red = true,
            SignalStatus::Yellow => controls.yellow = true,
            SignalStatus::Green => controls.green = true,
        }
    }

    #[cfg(test)]
    pub fn with(mut self, lane: Lane, status: SignalStatus) -> Self {
        self.press(lane, status);
        self
    }

    pub fn for_lane(&self, lane: Lane) -> LaneOverride {
        self.lanes[lane.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|controls| controls.resolve().is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneSignal {
    pub lane: Lane,
    pub recommended: SignalStatus,
    pub status: SignalStatus,
    pub overridden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaxLane {
    pub lane: Lane,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// One entry per canonical lane, in canonical order.
    pub final_status: [LaneSignal; 4],
    pub max_lane: MaxLane,
}

/// Order by total, descending. Equal totals keep their input order.
pub fn rank_lanes<L: Copy>(totals: &[(L, u64)]) -> Vec<(L, u64)> {
    let mut ranked = totals.to_vec();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// First rank GREEN, last rank RED, everything between YELLOW.
pub fn default_assignment<L: Copy + Ord>(totals: &[(L, u64)]) -> BTreeMap<L, SignalStatus> {
    let ranked = rank_lanes(totals);
    let last = ranked.len().saturating_sub(1);

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (lane, _))| {
            let status = if rank == 0 {
                SignalStatus::Green
            } else if rank < last {
                SignalStatus::Yellow
            } else {
                SignalStatus::Red
            };
            (lane, status)
        })
        .collect()
}

/// Highest total, first lane in canonical order on ties.
pub fn max_lane(totals: &LaneTotals) -> MaxLane {
    totals
        .iter()
        .map(|(lane, count)| MaxLane { lane, count })
        .reduce(|best, candidate| if candidate.count > best.count { candidate } else { best })
        .unwrap_or(MaxLane {
            lane: Lane::Lane1,
            count: 0,
        })
}

pub fn recommend(totals: &LaneTotals, overrides: &OverrideEvents) -> Recommendation {
    let ordered: Vec<(Lane, u64)> = totals.iter().collect();
    let default_status = default_assignment(&ordered);

    let final_status = Lane::ALL.map(|lane| {
        let recommended = default_status
            .get(&lane)
            .copied()
            .unwrap_or(SignalStatus::Red);
        match overrides.for_lane(lane).resolve() {
            Some(status) => LaneSignal {
                lane,
                recommended,
                status,
                overridden: true,
            },
            None => LaneSignal {
                lane,
                recommended,
                status: recommended,
                overridden: false,
            },
        }
    });

    Recommendation {
        final_status,
        max_lane: max_lane(totals),
    }
}
