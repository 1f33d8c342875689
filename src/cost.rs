//! Route cost and the guided-local-search augmented cost.

use crate::model::Instance;
use crate::route::{Move, Route, Schedule};

/// Cost in time units (travel, service, wait) plus penalty units.
pub type Cost = i64;

/// Evaluates the true objective of a route.
///
/// `cost = Σ (travel + service) over consecutive visited pairs
///       + Σ penalty over skipped nodes
///       + trailing_idle_weight * wait before the final anchor`.
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator<'a> {
    instance: &'a Instance,
    trailing_idle_weight: i64,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(instance: &'a Instance, trailing_idle_weight: i64) -> Self {
        Self {
            instance,
            trailing_idle_weight,
        }
    }

    /// Travel plus service time along `order`.
    pub fn transit(&self, order: &[usize]) -> Cost {
        order
            .windows(2)
            .map(|pair| self.instance.transit(pair[0], pair[1]))
            .sum()
    }

    /// Weighted wait between finishing the last visit and the earliest
    /// arrival at the final anchor.
    pub fn trailing_idle(&self, order: &[usize], schedule: &Schedule) -> Cost {
        if self.trailing_idle_weight == 0 || order.len() < 2 {
            return 0;
        }
        let last = order.len() - 1;
        let ready = schedule
            .arrival(last - 1)
            .start
            .saturating_add(self.instance.transit(order[last - 1], order[last]));
        let idle = schedule.arrival(last).start.saturating_sub(ready).max(0);
        idle.saturating_mul(self.trailing_idle_weight)
    }

    /// Penalties of every node left out of `route`.
    pub fn dropped(&self, route: &Route) -> Cost {
        route.skipped().map(|node| self.instance.penalty(node)).sum()
    }

    /// Change of the dropped-penalty term caused by `mv` on `route`.
    pub fn dropped_delta(&self, route: &Route, mv: &Move) -> Cost {
        match *mv {
            Move::Insert { node, .. } => -self.instance.penalty(node),
            Move::Remove { position } => self.instance.penalty(route.node_at(position)),
            Move::Replace { position, node } => {
                self.instance.penalty(route.node_at(position)) - self.instance.penalty(node)
            }
            Move::Relocate { .. } | Move::Reverse { .. } | Move::Swap { .. } => 0,
        }
    }

    /// Cost of a visiting order given the penalties already known to be dropped.
    pub fn order_cost(&self, order: &[usize], schedule: &Schedule, dropped: Cost) -> Cost {
        self.transit(order) + self.trailing_idle(order, schedule) + dropped
    }

    /// Full cost of a committed route.
    pub fn total(&self, route: &Route, schedule: &Schedule) -> Cost {
        self.order_cost(route.order(), schedule, self.dropped(route))
    }
}

/// Per-arc penalty counters of guided local search.
///
/// The counters only ever enter move evaluation through
/// [`ArcPenalties::augmented`]; reported costs never include them.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPenalties {
    size: usize,
    counts: Vec<u32>,
    lambda: f64,
}

impl ArcPenalties {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            counts: vec![0; size * size],
            lambda: 0.0,
        }
    }

    #[inline]
    pub fn count(&self, from: usize, to: usize) -> u32 {
        self.counts[from * self.size + to]
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda = lambda;
    }

    /// Sum of the penalty counters over the arcs of `order`.
    pub fn penalty(&self, order: &[usize]) -> u64 {
        order
            .windows(2)
            .map(|pair| u64::from(self.count(pair[0], pair[1])))
            .sum()
    }

    /// True cost plus `lambda` times the penalties of the arcs used.
    pub fn augmented(&self, cost: Cost, order: &[usize]) -> f64 {
        if self.lambda == 0.0 {
            return cost as f64;
        }
        cost as f64 + self.lambda * self.penalty(order) as f64
    }

    /// Raises the counters of the arcs of `order` with maximal utility
    /// `transit / (1 + count)`.
    ///
    /// Returns how many arcs were penalized; zero when every arc of the order
    /// is free and penalizing would not change the landscape.
    pub fn penalize(&mut self, instance: &Instance, order: &[usize]) -> usize {
        let utility = |from: usize, to: usize| {
            instance.transit(from, to) as f64 / (1.0 + f64::from(self.count(from, to)))
        };

        let best = order
            .windows(2)
            .map(|pair| utility(pair[0], pair[1]))
            .fold(0.0_f64, f64::max);
        if best <= 0.0 {
            return 0;
        }

        let chosen = order
            .windows(2)
            .filter(|pair| (utility(pair[0], pair[1]) - best).abs() <= f64::EPSILON * best)
            .map(|pair| (pair[0], pair[1]))
            .collect::<Vec<_>>();
        for &(from, to) in &chosen {
            let slot = &mut self.counts[from * self.size + to];
            *slot = slot.saturating_add(1);
        }
        chosen.len()
    }
}
