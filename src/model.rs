//! Instance model: locations, travel matrix, windows, service durations and
//! skip penalties for a multi-day itinerary.
//!
//! Nodes are laid out in a fixed order: `2 * days` day anchors first (start and
//! end of every day, alternating), then the fixed-time events, then regular
//! points of interest. An [`Instance`] is validated once on construction and is
//! read-only afterwards, so it can be shared freely between evaluation threads.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InstanceError;
use crate::windows::Interval;

/// Length of a day in time units (seconds).
pub const ONE_DAY: i64 = 86_400;

/// Raw instance record as supplied by an external loader.
///
/// Field names follow the interchange format (`Locations`, `Matrix`, ...).
/// `Windows` entries are `[earliest, latest]` pairs: absolute offsets for day
/// anchors and events, time of day for regular locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceData {
    pub locations: Vec<Value>,
    pub matrix: Vec<Vec<i64>>,
    pub windows: Vec<(i64, i64)>,
    pub service_costs: Vec<i64>,
    /// Skip penalty per node. Missing, `null` or zero means mandatory.
    #[serde(default)]
    pub penalties: Vec<Option<i64>>,
    pub number_of_days: usize,
    #[serde(default)]
    pub number_of_events: usize,
    /// Search budget in seconds.
    #[serde(default)]
    pub duration: u64,
}

/// Which end of a working day an anchor bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Start,
    End,
}

/// Role of a node, derived from its position in the node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Start or end of a working day. Never skippable.
    DayAnchor { day: usize, boundary: Boundary },
    /// Fixed-time appointment with a window over the whole horizon.
    Event,
    /// Ordinary point of interest, confined to working hours.
    Regular,
}

/// Dense row-major travel-time matrix. No triangle inequality is assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelMatrix {
    size: usize,
    data: Vec<i64>,
}

impl TravelMatrix {
    fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, InstanceError> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for (from, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(InstanceError::MatrixColumns {
                    row: from,
                    len: row.len(),
                    expected: size,
                });
            }
            if let Some((to, &value)) = row.iter().enumerate().find(|(_, value)| **value < 0) {
                return Err(InstanceError::NegativeTravel { from, to, value });
            }
            data.extend(row);
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.data[from * self.size + to]
    }
}

/// Validated, immutable problem instance.
#[derive(Debug, Clone)]
pub struct Instance {
    locations: Vec<Value>,
    matrix: TravelMatrix,
    windows: Vec<Interval>,
    service: Vec<i64>,
    penalties: Vec<i64>,
    days: usize,
    events: usize,
    budget: Duration,
}

impl Instance {
    /// Validates `data` and builds the instance.
    pub fn new(data: InstanceData) -> Result<Self, InstanceError> {
        let InstanceData {
            locations,
            matrix,
            windows,
            service_costs,
            penalties,
            number_of_days: days,
            number_of_events: events,
            duration,
        } = data;

        if days == 0 {
            return Err(InstanceError::NoDays);
        }

        let nodes = matrix.len();
        if matrix.len() != locations.len() {
            return Err(InstanceError::MatrixRows {
                rows: matrix.len(),
                expected: locations.len(),
            });
        }

        let anchors = 2 * days;
        if nodes < anchors {
            return Err(InstanceError::MissingAnchors {
                days,
                required: anchors,
                nodes,
            });
        }
        if anchors + events > nodes {
            return Err(InstanceError::TooManyEvents {
                events,
                anchors,
                nodes,
            });
        }

        let matrix = TravelMatrix::from_rows(matrix)?;

        check_aligned("Windows", windows.len(), nodes)?;
        check_aligned("ServiceCosts", service_costs.len(), nodes)?;
        // An empty penalty list means every node is mandatory.
        if !penalties.is_empty() {
            check_aligned("Penalties", penalties.len(), nodes)?;
        }

        let windows = windows
            .into_iter()
            .enumerate()
            .map(|(node, (earliest, latest))| {
                if earliest > latest {
                    Err(InstanceError::InvertedWindow {
                        node,
                        earliest,
                        latest,
                    })
                } else {
                    Ok(Interval::new(earliest, latest))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some((node, &value)) = service_costs.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(InstanceError::NegativeService { node, value });
        }

        let mut resolved = vec![0; nodes];
        for (node, penalty) in penalties.into_iter().enumerate() {
            match penalty {
                Some(value) if value < 0 => {
                    return Err(InstanceError::NegativePenalty { node, value });
                }
                Some(value) => resolved[node] = value,
                None => {}
            }
        }

        Ok(Self {
            locations,
            matrix,
            windows,
            service: service_costs,
            penalties: resolved,
            days,
            events,
            budget: Duration::from_secs(duration),
        })
    }

    /// Parses and validates an instance from its JSON interchange form.
    pub fn from_json(json: &str) -> Result<Self, crate::error::PlanError> {
        let data: InstanceData = serde_json::from_str(json)?;
        Ok(Self::new(data)?)
    }

    /// Number of nodes (anchors, events and regular locations).
    pub fn len(&self) -> usize {
        self.matrix.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn events(&self) -> usize {
        self.events
    }

    /// Search budget recorded in the instance.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// End of the planning horizon; no arrival may fall after it.
    pub fn horizon(&self) -> i64 {
        (self.days as i64).saturating_mul(ONE_DAY)
    }

    pub fn matrix(&self) -> &TravelMatrix {
        &self.matrix
    }

    #[inline]
    pub fn travel(&self, from: usize, to: usize) -> i64 {
        self.matrix.get(from, to)
    }

    #[inline]
    pub fn service(&self, node: usize) -> i64 {
        self.service[node]
    }

    /// Travel plus service time charged for the arc `from -> to`.
    #[inline]
    pub fn transit(&self, from: usize, to: usize) -> i64 {
        self.travel(from, to).saturating_add(self.service(from))
    }

    /// Configured skip penalty; zero when absent.
    #[inline]
    pub fn penalty(&self, node: usize) -> i64 {
        self.penalties[node]
    }

    /// Window exactly as configured, before any day restriction.
    pub fn window(&self, node: usize) -> Interval {
        self.windows[node]
    }

    pub fn payload(&self, node: usize) -> &Value {
        &self.locations[node]
    }

    pub fn category(&self, node: usize) -> Category {
        let anchors = 2 * self.days;
        if node < anchors {
            let boundary = if node % 2 == 0 {
                Boundary::Start
            } else {
                Boundary::End
            };
            Category::DayAnchor {
                day: node / 2,
                boundary,
            }
        } else if node < anchors + self.events {
            Category::Event
        } else {
            Category::Regular
        }
    }

    pub fn is_anchor(&self, node: usize) -> bool {
        node < 2 * self.days
    }

    /// Start anchor of the first day.
    pub fn first_anchor(&self) -> usize {
        0
    }

    /// End anchor of the last day.
    pub fn last_anchor(&self) -> usize {
        2 * self.days - 1
    }

    /// Working hours of `day`: from the start anchor's earliest time to the
    /// end anchor's earliest time.
    pub fn working_hours(&self, day: usize) -> Interval {
        let start = self.windows[2 * day].start;
        let end = self.windows[2 * day + 1].start;
        Interval::new(start, end)
    }

    /// Whether `node` may be left out of the route against its penalty.
    ///
    /// Anchors never are. Regular locations are when they carry a positive
    /// penalty; events only when `droppable_events` is set.
    pub fn is_optional(&self, node: usize, droppable_events: bool) -> bool {
        match self.category(node) {
            Category::DayAnchor { .. } => false,
            Category::Event => droppable_events && self.penalty(node) > 0,
            Category::Regular => self.penalty(node) > 0,
        }
    }
}

fn check_aligned(field: &'static str, len: usize, expected: usize) -> Result<(), InstanceError> {
    if len == expected {
        Ok(())
    } else {
        Err(InstanceError::Misaligned {
            field,
            len,
            expected,
        })
    }
}
