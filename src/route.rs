//! Route state and arrival-time propagation.
//!
//! A [`Route`] is the visiting order plus a node-to-position index. Moves are
//! evaluated speculatively on a copy of the order; the [`Propagator`] turns an
//! order into a [`Schedule`] of arrival windows or rejects it. Only a route
//! whose every position has a non-empty window is ever committed.

use crate::model::Instance;
use crate::windows::{DayWindows, Interval};

/// Internal rejection of a candidate order. Never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InfeasibleMove;

/// A route modification. Positions refer to the order before the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Insert a skipped node so that it ends up at `position`.
    Insert { node: usize, position: usize },
    /// Drop the node at `position`.
    Remove { position: usize },
    /// Drop the node at `position` and visit the skipped `node` there instead.
    Replace { position: usize, node: usize },
    /// Take the node at `from` out and re-insert it at index `to` of the
    /// shortened order.
    Relocate { from: usize, to: usize },
    /// Reverse positions `start..=end`.
    Reverse { start: usize, end: usize },
    /// Exchange the nodes at two positions.
    Swap { first: usize, second: usize },
}

impl Move {
    /// Applies the move to a bare visiting order.
    pub fn apply_to(&self, order: &mut Vec<usize>) {
        match *self {
            Move::Insert { node, position } => order.insert(position, node),
            Move::Remove { position } => {
                order.remove(position);
            }
            Move::Replace { position, node } => order[position] = node,
            Move::Relocate { from, to } => {
                let node = order.remove(from);
                order.insert(to, node);
            }
            Move::Reverse { start, end } => order[start..=end].reverse(),
            Move::Swap { first, second } => order.swap(first, second),
        }
    }
}

/// Bidirectional mapping between route positions and node indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionIndex {
    position_of: Vec<Option<usize>>,
}

impl PositionIndex {
    fn build(nodes: usize, order: &[usize]) -> Self {
        let mut position_of = vec![None; nodes];
        for (position, &node) in order.iter().enumerate() {
            position_of[node] = Some(position);
        }
        Self { position_of }
    }

    fn refresh(&mut self, order: &[usize], from: usize) {
        for (position, &node) in order.iter().enumerate().skip(from) {
            self.position_of[node] = Some(position);
        }
    }

    pub fn position_of(&self, node: usize) -> Option<usize> {
        self.position_of[node]
    }
}

/// Visiting order from the first day's start anchor to the last day's end
/// anchor. Nodes not in the order are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    order: Vec<usize>,
    index: PositionIndex,
}

impl Route {
    /// Route visiting exactly `order`.
    pub fn new(nodes: usize, order: Vec<usize>) -> Self {
        let index = PositionIndex::build(nodes, &order);
        Self { order, index }
    }

    /// Route through the day anchors only, in day order.
    pub fn anchors_only(instance: &Instance) -> Self {
        Self::new(instance.len(), (0..=instance.last_anchor()).collect())
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node_at(&self, position: usize) -> usize {
        self.order[position]
    }

    pub fn position_of(&self, node: usize) -> Option<usize> {
        self.index.position_of(node)
    }

    pub fn is_visited(&self, node: usize) -> bool {
        self.index.position_of(node).is_some()
    }

    /// Nodes of the instance that are not part of the route.
    pub fn skipped(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.index.position_of.len()).filter(|&node| !self.is_visited(node))
    }

    /// Copy of the order with `mv` applied, for speculative evaluation.
    pub fn with_move(&self, mv: &Move) -> Vec<usize> {
        let mut order = self.order.clone();
        mv.apply_to(&mut order);
        order
    }

    /// Commits `mv`, keeping the position index in sync.
    pub fn apply(&mut self, mv: &Move) {
        let first_changed = match *mv {
            Move::Insert { position, .. } => position,
            Move::Remove { position } => {
                self.index.position_of[self.order[position]] = None;
                position
            }
            Move::Replace { position, .. } => {
                self.index.position_of[self.order[position]] = None;
                position
            }
            Move::Relocate { from, to } => from.min(to),
            Move::Reverse { start, .. } => start,
            Move::Swap { first, second } => first.min(second),
        };
        mv.apply_to(&mut self.order);
        self.index.refresh(&self.order, first_changed);
    }
}

/// Earliest and latest feasible arrival per route position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    arrivals: Vec<Interval>,
}

impl Schedule {
    pub fn arrivals(&self) -> &[Interval] {
        &self.arrivals
    }

    pub fn arrival(&self, position: usize) -> Interval {
        self.arrivals[position]
    }
}

/// Computes arrival windows for a visiting order.
#[derive(Debug, Clone, Copy)]
pub struct Propagator<'a> {
    instance: &'a Instance,
    windows: &'a DayWindows,
}

impl<'a> Propagator<'a> {
    pub fn new(instance: &'a Instance, windows: &'a DayWindows) -> Self {
        Self { instance, windows }
    }

    /// Forward pass for the earliest arrivals, backward pass from the end
    /// anchor for the latest ones.
    ///
    /// Arrivals always snap into a location's allowed set, so a regular
    /// location that cannot be reached on one day is tried on the next day
    /// before the order is rejected.
    pub(crate) fn propagate(&self, order: &[usize]) -> Result<Schedule, InfeasibleMove> {
        let Some(&first) = order.first() else {
            return Err(InfeasibleMove);
        };

        let mut earliest = Vec::with_capacity(order.len());
        let mut time = self
            .windows
            .allowed(first)
            .earliest_from(i64::MIN)
            .ok_or(InfeasibleMove)?;
        earliest.push(time);
        for pair in order.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            time = self
                .windows
                .allowed(to)
                .earliest_from(time.saturating_add(self.instance.transit(from, to)))
                .ok_or(InfeasibleMove)?;
            earliest.push(time);
        }

        let mut latest = vec![0; order.len()];
        let last = order.len() - 1;
        let mut time = self
            .windows
            .allowed(order[last])
            .latest_until(i64::MAX)
            .ok_or(InfeasibleMove)?;
        latest[last] = time;
        for position in (0..last).rev() {
            let (from, to) = (order[position], order[position + 1]);
            time = self
                .windows
                .allowed(from)
                .latest_until(time.saturating_sub(self.instance.transit(from, to)))
                .ok_or(InfeasibleMove)?;
            latest[position] = time;
        }

        let arrivals = earliest
            .into_iter()
            .zip(latest)
            .map(|(min, max)| Interval::new(min, max))
            .collect::<Vec<_>>();
        if arrivals.iter().any(Interval::is_empty) {
            return Err(InfeasibleMove);
        }

        Ok(Schedule { arrivals })
    }
}

/// A committed route with its arrival windows and true cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub route: Route,
    pub schedule: Schedule,
    pub cost: i64,
}
