//! Test fixtures for itinerary-planner.
//!
//! Provides:
//! - A chainable builder producing interchange-format instances
//! - Real Las Vegas sightseeing locations for realistic tours
//! - Property checks shared by every integration test

#![allow(dead_code)]

pub mod las_vegas_locations;

use std::collections::{HashMap, HashSet};

use serde_json::json;

use itinerary_planner::model::{Category, Instance, InstanceData, ONE_DAY};
use itinerary_planner::windows::DayWindows;
use itinerary_planner::PlannerResult;

pub fn hours(h: i64) -> i64 {
    h * 3600
}

pub fn minutes(m: i64) -> i64 {
    m * 60
}

/// Builder for a non-anchor node with sensible defaults: open all day, no
/// service time, mandatory.
#[derive(Clone, Debug)]
pub struct TestStop {
    pub name: String,
    pub window: (i64, i64),
    pub service: i64,
    pub penalty: Option<i64>,
}

impl TestStop {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            window: (0, ONE_DAY),
            service: 0,
            penalty: None,
        }
    }

    pub fn window(mut self, earliest: i64, latest: i64) -> Self {
        self.window = (earliest, latest);
        self
    }

    pub fn service(mut self, duration: i64) -> Self {
        self.service = duration;
        self
    }

    pub fn penalty(mut self, penalty: i64) -> Self {
        self.penalty = Some(penalty);
        self
    }
}

/// Builds instances with named nodes. Anchors are named `day{d}-start` and
/// `day{d}-end`; travel between two anchors is free unless overridden.
#[derive(Clone, Debug)]
pub struct InstanceBuilder {
    days: usize,
    working_hours: (i64, i64),
    events: Vec<TestStop>,
    regular: Vec<TestStop>,
    default_travel: i64,
    overrides: HashMap<(String, String), i64>,
    duration: u64,
}

impl InstanceBuilder {
    pub fn new(days: usize) -> Self {
        Self {
            days,
            working_hours: (hours(8), hours(18)),
            events: Vec::new(),
            regular: Vec::new(),
            default_travel: minutes(10),
            overrides: HashMap::new(),
            duration: 0,
        }
    }

    /// Daily working hours as time of day.
    pub fn working_hours(mut self, start: i64, end: i64) -> Self {
        self.working_hours = (start, end);
        self
    }

    pub fn event(mut self, stop: TestStop) -> Self {
        self.events.push(stop);
        self
    }

    pub fn location(mut self, stop: TestStop) -> Self {
        self.regular.push(stop);
        self
    }

    pub fn default_travel(mut self, travel: i64) -> Self {
        self.default_travel = travel;
        self
    }

    /// Symmetric travel time between two named nodes.
    pub fn travel(mut self, a: &str, b: &str, travel: i64) -> Self {
        self.overrides.insert((a.to_string(), b.to_string()), travel);
        self.overrides.insert((b.to_string(), a.to_string()), travel);
        self
    }

    /// Travel time from `from` to `to` only.
    pub fn arc(mut self, from: &str, to: &str, travel: i64) -> Self {
        self.overrides.insert((from.to_string(), to.to_string()), travel);
        self
    }

    /// Symmetric travel time between `name` and every anchor.
    pub fn travel_from_anchors(mut self, name: &str, travel: i64) -> Self {
        for anchor in self.anchor_names() {
            self = self.travel(name, &anchor, travel);
        }
        self
    }

    pub fn duration(mut self, seconds: u64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn anchor_names(&self) -> Vec<String> {
        (0..self.days)
            .flat_map(|day| [format!("day{day}-start"), format!("day{day}-end")])
            .collect()
    }

    pub fn data(&self) -> InstanceData {
        let anchors = self.anchor_names();
        let mut names = anchors.clone();
        let mut windows = Vec::new();
        let mut service_costs = vec![0; anchors.len()];
        let mut penalties = vec![None; anchors.len()];

        for day in 0..self.days as i64 {
            let start = day * ONE_DAY + self.working_hours.0;
            let end = day * ONE_DAY + self.working_hours.1;
            windows.push((start, start));
            windows.push((end, end));
        }
        for stop in self.events.iter().chain(&self.regular) {
            names.push(stop.name.clone());
            windows.push(stop.window);
            service_costs.push(stop.service);
            penalties.push(stop.penalty);
        }

        let is_anchor = |index: usize| index < anchors.len();
        let matrix = names
            .iter()
            .enumerate()
            .map(|(i, from)| {
                names
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            return 0;
                        }
                        if let Some(&travel) = self.overrides.get(&(from.clone(), to.clone())) {
                            return travel;
                        }
                        if is_anchor(i) && is_anchor(j) {
                            0
                        } else {
                            self.default_travel
                        }
                    })
                    .collect()
            })
            .collect();

        InstanceData {
            locations: names.iter().map(|name| json!({ "name": name })).collect(),
            matrix,
            windows,
            service_costs,
            penalties,
            number_of_days: self.days,
            number_of_events: self.events.len(),
            duration: self.duration,
        }
    }

    pub fn build(&self) -> Instance {
        Instance::new(self.data()).unwrap()
    }
}

pub fn name_of(instance: &Instance, node: usize) -> &str {
    instance.payload(node)["name"].as_str().unwrap_or_default()
}

pub fn scheduled_names<'a>(instance: &'a Instance, result: &PlannerResult) -> Vec<&'a str> {
    result
        .scheduled
        .iter()
        .map(|visit| name_of(instance, visit.node))
        .collect()
}

pub fn dropped_names<'a>(instance: &'a Instance, result: &PlannerResult) -> Vec<&'a str> {
    result
        .dropped
        .iter()
        .map(|&node| name_of(instance, node))
        .collect()
}

/// Checks the properties every returned itinerary must satisfy.
pub fn assert_valid(instance: &Instance, result: &PlannerResult, droppable_events: bool) {
    let windows = DayWindows::restrict(instance);

    // Anchors: first and last fixed, all present in day order.
    assert_eq!(result.scheduled.first().map(|v| v.node), Some(instance.first_anchor()));
    assert_eq!(result.scheduled.last().map(|v| v.node), Some(instance.last_anchor()));
    let anchors = result
        .scheduled
        .iter()
        .map(|visit| visit.node)
        .filter(|&node| instance.is_anchor(node))
        .collect::<Vec<_>>();
    assert_eq!(anchors, (0..=instance.last_anchor()).collect::<Vec<_>>());

    for pair in result.scheduled.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        assert!(
            from.earliest_arrival + instance.transit(from.node, to.node) <= to.earliest_arrival,
            "earliest arrivals must respect travel and service from {} to {}",
            from.node,
            to.node
        );
    }

    for visit in &result.scheduled {
        let allowed = windows.allowed(visit.node);
        assert!(visit.earliest_arrival <= visit.latest_arrival, "{visit:?}");
        assert!(allowed.contains(visit.earliest_arrival), "{visit:?}");
        assert!(allowed.contains(visit.latest_arrival), "{visit:?}");
        assert!(visit.latest_arrival <= instance.horizon(), "{visit:?}");

        if visit.category == Category::Regular {
            for time in [visit.earliest_arrival, visit.latest_arrival] {
                let day = (time / ONE_DAY) as usize;
                let working = instance.working_hours(day.min(instance.days() - 1));
                assert!(working.contains(time), "{visit:?} outside working hours");
            }
        }
    }

    // Conservation of optional locations.
    let optional = (0..instance.len())
        .filter(|&node| instance.is_optional(node, droppable_events))
        .collect::<HashSet<_>>();
    let scheduled = result.scheduled.iter().map(|v| v.node).collect::<Vec<_>>();
    let unique = scheduled.iter().copied().collect::<HashSet<_>>();
    assert_eq!(unique.len(), scheduled.len(), "duplicate visits in {scheduled:?}");

    let dropped = result.dropped.iter().copied().collect::<HashSet<_>>();
    assert_eq!(dropped.len(), result.dropped.len(), "duplicate drops");
    assert!(dropped.is_disjoint(&unique));
    assert!(dropped.is_subset(&optional), "only optional locations may be dropped");
    let accounted = unique
        .iter()
        .copied()
        .filter(|node| optional.contains(node))
        .chain(dropped.iter().copied())
        .collect::<HashSet<_>>();
    assert_eq!(accounted, optional);
    assert_eq!(unique.len() + dropped.len(), instance.len());
}
