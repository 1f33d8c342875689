//! Day-window restriction.
//!
//! A regular location may only be reached inside the working hours of some
//! day, and only inside its own time-of-day window shifted onto that day. The
//! result is a union of up to `days` disjoint intervals per location, kept as an
//! [`AllowedSet`]. Propagation asks the set for the nearest admissible time
//! instead of carving ranges out of a mutable domain.

use crate::model::{Category, Instance, ONE_DAY};

/// Closed interval `[start, end]` of time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Overlap of two intervals, `None` when they are disjoint.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let overlap = Interval::new(self.start.max(other.start), self.end.min(other.end));
        (!overlap.is_empty()).then_some(overlap)
    }
}

/// Sorted union of disjoint, non-empty intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedSet {
    intervals: Vec<Interval>,
}

impl AllowedSet {
    pub fn single(interval: Interval) -> Self {
        Self::from_intervals(vec![interval])
    }

    /// Builds a set from arbitrary intervals, dropping empty ones and merging
    /// overlapping or touching ones.
    pub fn from_intervals(mut intervals: Vec<Interval>) -> Self {
        intervals.retain(|interval| !interval.is_empty());
        intervals.sort_by_key(|interval| interval.start);

        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end.saturating_add(1) => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        Self { intervals: merged }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains(&self, time: i64) -> bool {
        self.intervals.iter().any(|interval| interval.contains(time))
    }

    /// Smallest admissible time not earlier than `time`.
    ///
    /// Falls through to the next interval (the next day, for regular
    /// locations) when `time` lies past the current one.
    pub fn earliest_from(&self, time: i64) -> Option<i64> {
        let index = self.intervals.partition_point(|interval| interval.end < time);
        self.intervals
            .get(index)
            .map(|interval| interval.start.max(time))
    }

    /// Largest admissible time not later than `time`.
    pub fn latest_until(&self, time: i64) -> Option<i64> {
        let index = self
            .intervals
            .partition_point(|interval| interval.start <= time);
        index
            .checked_sub(1)
            .map(|last| self.intervals[last].end.min(time))
    }
}

/// Effective allowed arrival sets for every node of an instance.
#[derive(Debug, Clone)]
pub struct DayWindows {
    sets: Vec<AllowedSet>,
}

impl DayWindows {
    /// Derives the allowed sets once from the instance.
    ///
    /// Anchors and events keep their configured window, clipped to the
    /// horizon. Regular locations get one sub-interval per day:
    /// `[day + earliest, day + latest]`, bounded by the day itself and by that
    /// day's working hours.
    pub fn restrict(instance: &Instance) -> Self {
        let horizon = Interval::new(0, instance.horizon());
        let sets = (0..instance.len())
            .map(|node| match instance.category(node) {
                Category::DayAnchor { .. } | Category::Event => instance
                    .window(node)
                    .intersect(&horizon)
                    .map(AllowedSet::single)
                    .unwrap_or_default(),
                Category::Regular => restrict_to_days(instance, node),
            })
            .collect();

        Self { sets }
    }

    pub fn allowed(&self, node: usize) -> &AllowedSet {
        &self.sets[node]
    }

    /// Whether `node` can be reached at all.
    pub fn is_reachable(&self, node: usize) -> bool {
        !self.sets[node].is_empty()
    }
}

fn restrict_to_days(instance: &Instance, node: usize) -> AllowedSet {
    let window = instance.window(node);
    let per_day = (0..instance.days())
        .filter_map(|day| {
            let day_start = (day as i64).saturating_mul(ONE_DAY);
            let day_end = day_start.saturating_add(ONE_DAY);
            let local = Interval::new(
                day_start.max(day_start.saturating_add(window.start)),
                day_end.min(day_start.saturating_add(window.end)),
            );
            local.intersect(&instance.working_hours(day))
        })
        .collect();

    AllowedSet::from_intervals(per_day)
}
