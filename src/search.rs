//! Local search driver with guided local search.
//!
//! Neighbourhoods are tried in round-robin. Each pass generates its candidate
//! moves, scores them against the frozen current solution (optionally on rayon
//! workers) and commits the best one whose augmented cost is strictly lower.
//! When a full round finds nothing, the current route is a local optimum of the
//! augmented objective: the arcs with the highest utility get penalized and the
//! search continues. The best solution by true cost is kept in its own slot
//! and only replaced by a strictly cheaper one, so stopping at any point yields
//! a complete, propagated solution.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::cost::{ArcPenalties, Cost, CostEvaluator};
use crate::model::Instance;
use crate::route::{Move, Propagator, Route, Schedule, Solution};
use crate::solver::SolveOptions;
use crate::windows::DayWindows;

/// Wall-clock limit polled by the search.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Deadline `budget` from now. Budgets too large to represent never expire.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    pub fn expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// Move families explored by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbourhood {
    /// Visit a skipped optional location.
    Insertion,
    /// Skip a visited optional location.
    Removal,
    /// Trade a visited optional location for a skipped one.
    Replacement,
    /// Move a visited location elsewhere in the route.
    Relocation,
    /// Reverse a run of visited locations between two anchors.
    Reversal,
    /// Exchange two visited locations.
    Swap,
}

const ROUND_ROBIN: [Neighbourhood; 6] = [
    Neighbourhood::Insertion,
    Neighbourhood::Relocation,
    Neighbourhood::Reversal,
    Neighbourhood::Swap,
    Neighbourhood::Replacement,
    Neighbourhood::Removal,
];

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Neighbourhood passes performed.
    pub iterations: usize,
    /// Times the guided penalties were raised at a local optimum.
    pub penalty_updates: usize,
    pub initial_cost: Cost,
    pub final_cost: Cost,
    /// Cost of the best solution each time it strictly improved, starting
    /// with the seed.
    pub best_costs: Vec<Cost>,
}

#[derive(Debug)]
struct Scored {
    augmented: f64,
    cost: Cost,
    schedule: Schedule,
}

/// Improves a seed solution until the deadline.
#[derive(Debug, Clone, Copy)]
pub struct LocalSearch<'a> {
    instance: &'a Instance,
    windows: &'a DayWindows,
    optional: &'a [bool],
    evaluator: CostEvaluator<'a>,
    options: &'a SolveOptions,
}

impl<'a> LocalSearch<'a> {
    pub fn new(
        instance: &'a Instance,
        windows: &'a DayWindows,
        optional: &'a [bool],
        evaluator: CostEvaluator<'a>,
        options: &'a SolveOptions,
    ) -> Self {
        Self {
            instance,
            windows,
            optional,
            evaluator,
            options,
        }
    }

    /// Runs the search and returns the best solution found with its stats.
    pub fn run(&self, seed: Solution, deadline: &Deadline) -> (Solution, SolveStats) {
        let mut stats = SolveStats {
            initial_cost: seed.cost,
            final_cost: seed.cost,
            best_costs: vec![seed.cost],
            ..SolveStats::default()
        };
        let mut penalties = ArcPenalties::new(self.instance.len());
        let mut best = seed.clone();
        let mut current = seed;
        let mut idle_passes = 0;

        for kind in ROUND_ROBIN.iter().copied().cycle() {
            if deadline.expired() {
                break;
            }
            if self
                .options
                .max_iterations
                .is_some_and(|limit| stats.iterations >= limit)
            {
                break;
            }
            stats.iterations += 1;

            let moves = self.candidates(kind, &current.route);
            let found = self.best_move(&current, &moves, &penalties, deadline);
            trace!(?kind, candidates = moves.len(), improved = found.is_some(), "neighbourhood pass");

            if let Some((mv, scored)) = found {
                current.route.apply(&mv);
                current.schedule = scored.schedule;
                current.cost = scored.cost;
                idle_passes = 0;

                if current.cost < best.cost {
                    debug!(cost = current.cost, previous = best.cost, ?kind, "new best solution");
                    best = current.clone();
                    stats.best_costs.push(best.cost);
                }
                continue;
            }

            idle_passes += 1;
            if idle_passes < ROUND_ROBIN.len() {
                continue;
            }
            idle_passes = 0;

            if penalties.lambda() == 0.0 {
                penalties.set_lambda(self.initial_lambda(&current.route));
            }
            let raised = penalties.penalize(self.instance, current.route.order());
            if raised == 0 || penalties.lambda() <= 0.0 {
                debug!(cost = current.cost, "local optimum with nothing to penalize");
                break;
            }
            stats.penalty_updates += 1;
            debug!(
                arcs = raised,
                lambda = penalties.lambda(),
                cost = current.cost,
                "guided penalties raised"
            );
        }

        stats.final_cost = best.cost;
        (best, stats)
    }

    /// Scale of the guided term: a fraction of the average arc transit of
    /// `route`. Skip penalties stay out so they do not inflate it.
    pub fn initial_lambda(&self, route: &Route) -> f64 {
        let arcs = route.len().saturating_sub(1).max(1);
        let transit = self.evaluator.transit(route.order());
        self.options.gls_lambda_coefficient * transit as f64 / arcs as f64
    }

    /// Every move of `kind` applicable to `route`. Anchors never move.
    pub fn candidates(&self, kind: Neighbourhood, route: &Route) -> Vec<Move> {
        let len = route.len();
        let inner = 1..len.saturating_sub(1);
        let movable = inner
            .clone()
            .filter(|&position| !self.instance.is_anchor(route.node_at(position)))
            .collect::<Vec<_>>();
        let droppable = movable
            .iter()
            .copied()
            .filter(|&position| self.optional[route.node_at(position)])
            .collect::<Vec<_>>();
        let insertable = route
            .skipped()
            .filter(|&node| self.optional[node] && self.windows.is_reachable(node))
            .collect::<Vec<_>>();

        match kind {
            Neighbourhood::Insertion => insertable
                .iter()
                .flat_map(|&node| (1..len).map(move |position| Move::Insert { node, position }))
                .collect(),
            Neighbourhood::Removal => droppable
                .iter()
                .map(|&position| Move::Remove { position })
                .collect(),
            Neighbourhood::Replacement => droppable
                .iter()
                .flat_map(|&position| {
                    insertable
                        .iter()
                        .map(move |&node| Move::Replace { position, node })
                })
                .collect(),
            Neighbourhood::Relocation => movable
                .iter()
                .flat_map(|&from| {
                    inner
                        .clone()
                        .filter(move |&to| to != from)
                        .map(move |to| Move::Relocate { from, to })
                })
                .collect(),
            Neighbourhood::Reversal => {
                let mut moves = Vec::new();
                for &start in &movable {
                    for end in start + 1..len - 1 {
                        if self.instance.is_anchor(route.node_at(end)) {
                            break;
                        }
                        moves.push(Move::Reverse { start, end });
                    }
                }
                moves
            }
            Neighbourhood::Swap => movable
                .iter()
                .enumerate()
                .flat_map(|(index, &first)| {
                    movable[index + 1..]
                        .iter()
                        .map(move |&second| Move::Swap { first, second })
                })
                .collect(),
        }
    }

    /// Cheapest move by augmented cost that strictly improves on `current`.
    fn best_move(
        &self,
        current: &Solution,
        moves: &[Move],
        penalties: &ArcPenalties,
        deadline: &Deadline,
    ) -> Option<(Move, Scored)> {
        let dropped = self.evaluator.dropped(&current.route);
        let threshold = penalties.augmented(current.cost, current.route.order()) - 1e-9;
        let score = |(index, mv): (usize, &Move)| {
            self.score(current, mv, dropped, penalties, threshold, deadline)
                .map(|scored| (index, scored))
        };
        let order = |a: &(usize, Scored), b: &(usize, Scored)| {
            a.1.augmented
                .total_cmp(&b.1.augmented)
                .then(a.0.cmp(&b.0))
        };

        let best = if self.options.parallel_evaluation {
            moves.par_iter().enumerate().filter_map(score).min_by(order)
        } else {
            moves.iter().enumerate().filter_map(score).min_by(order)
        };
        best.map(|(index, scored)| (moves[index], scored))
    }

    /// Propagates and prices one candidate; `None` when it is infeasible, not
    /// improving, or the deadline has passed.
    fn score(
        &self,
        current: &Solution,
        mv: &Move,
        dropped: Cost,
        penalties: &ArcPenalties,
        threshold: f64,
        deadline: &Deadline,
    ) -> Option<Scored> {
        if deadline.expired() {
            return None;
        }
        let order = current.route.with_move(mv);
        let schedule = Propagator::new(self.instance, self.windows)
            .propagate(&order)
            .ok()?;
        let dropped = dropped + self.evaluator.dropped_delta(&current.route, mv);
        let cost = self.evaluator.order_cost(&order, &schedule, dropped);
        let augmented = penalties.augmented(cost, &order);
        (augmented < threshold).then_some(Scored {
            augmented,
            cost,
            schedule,
        })
    }
}
