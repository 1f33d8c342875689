//! Construction heuristic producing the seed solution.
//!
//! Every optional location starts unperformed. The route holds the day anchors
//! in order, and each mandatory location is inserted at its cheapest feasible
//! position, earliest window first. Local search then earns every optional
//! insertion by net cost reduction, so even a zero budget returns a valid
//! answer.
//!
//! Greedy insertion can paint itself into a corner when mandatory locations
//! interact, and some feasible orders have no feasible sub-order to grow from.
//! When it gets stuck, the mandatory locations and anchors are sequenced
//! forward in time with a bounded depth-first search instead.

use tracing::{debug, warn};

use crate::cost::CostEvaluator;
use crate::error::PlanError;
use crate::model::Instance;
use crate::route::{Move, Propagator, Route, Schedule, Solution};
use crate::windows::DayWindows;

/// Partial sequences expanded before the fallback gives up.
const SEQUENCING_BUDGET: usize = 100_000;

/// Builds the all-unperformed seed.
///
/// Fails with [`PlanError::NoFeasibleSolution`] when the anchors and the
/// mandatory locations cannot be scheduled together.
pub fn all_unperformed(
    instance: &Instance,
    windows: &DayWindows,
    optional: &[bool],
    evaluator: &CostEvaluator<'_>,
) -> Result<Solution, PlanError> {
    let propagator = Propagator::new(instance, windows);
    let anchors = Route::anchors_only(instance);
    let anchored = propagator.propagate(anchors.order()).map_err(|_| {
        warn!(days = instance.days(), "day anchors cannot be scheduled");
        PlanError::NoFeasibleSolution
    })?;

    let mut mandatory = (0..instance.len())
        .filter(|&node| !instance.is_anchor(node) && !optional[node])
        .collect::<Vec<_>>();
    mandatory.sort_by_key(|&node| {
        let opens = windows
            .allowed(node)
            .intervals()
            .first()
            .map_or(i64::MAX, |interval| interval.start);
        (opens, node)
    });

    let seeded = cheapest_insertion(&propagator, evaluator, anchors, anchored, &mandatory)
        .or_else(|| {
            debug!(
                mandatory = mandatory.len(),
                "cheapest insertion stuck, sequencing mandatory locations"
            );
            Sequencer::new(instance, windows, &mandatory).run()
        });
    let Some((route, schedule)) = seeded else {
        warn!(
            mandatory = mandatory.len(),
            "mandatory locations cannot be scheduled together"
        );
        return Err(PlanError::NoFeasibleSolution);
    };

    let cost = evaluator.total(&route, &schedule);
    Ok(Solution {
        route,
        schedule,
        cost,
    })
}

/// Inserts `mandatory` one by one at the cheapest feasible position.
fn cheapest_insertion(
    propagator: &Propagator<'_>,
    evaluator: &CostEvaluator<'_>,
    mut route: Route,
    mut schedule: Schedule,
    mandatory: &[usize],
) -> Option<(Route, Schedule)> {
    for &node in mandatory {
        let mut best = None;
        for position in 1..route.len() {
            let mv = Move::Insert { node, position };
            let order = route.with_move(&mv);
            let Ok(candidate) = propagator.propagate(&order) else {
                continue;
            };
            let transit = evaluator.transit(&order);
            if best.as_ref().is_none_or(|(cost, _, _)| transit < *cost) {
                best = Some((transit, mv, candidate));
            }
        }

        let Some((_, mv, candidate)) = best else {
            debug!(node, "no feasible insertion position");
            return None;
        };
        route.apply(&mv);
        schedule = candidate;
    }
    Some((route, schedule))
}

/// Depth-first search over visiting orders of the anchors and mandatory
/// locations, always extending the route at its end with the earliest
/// possible arrival time.
///
/// Anchors are taken in day order and the last anchor only once every
/// mandatory location is placed. Waiting is allowed, so the earliest arrival
/// at the end of a partial order is all the state a branch needs.
struct Sequencer<'a> {
    instance: &'a Instance,
    windows: &'a DayWindows,
    propagator: Propagator<'a>,
    pending: Vec<usize>,
    order: Vec<usize>,
    expansions: usize,
}

impl<'a> Sequencer<'a> {
    fn new(instance: &'a Instance, windows: &'a DayWindows, mandatory: &[usize]) -> Self {
        Self {
            instance,
            windows,
            propagator: Propagator::new(instance, windows),
            pending: mandatory.to_vec(),
            order: Vec::with_capacity(instance.last_anchor() + 1 + mandatory.len()),
            expansions: 0,
        }
    }

    fn run(mut self) -> Option<(Route, Schedule)> {
        let first = self.instance.first_anchor();
        let start = self.windows.allowed(first).earliest_from(i64::MIN)?;
        self.order.push(first);
        let schedule = self.extend(start, first + 1)?;
        debug!(expansions = self.expansions, "mandatory locations sequenced");
        Some((Route::new(self.instance.len(), self.order), schedule))
    }

    fn extend(&mut self, time: i64, next_anchor: usize) -> Option<Schedule> {
        let last_anchor = self.instance.last_anchor();
        if self.order.last() == Some(&last_anchor) {
            return self.propagator.propagate(&self.order).ok();
        }
        if self.expansions >= SEQUENCING_BUDGET {
            return None;
        }
        self.expansions += 1;

        // Time only moves forward, so a location already out of reach stays so.
        if self
            .pending
            .iter()
            .any(|&node| self.windows.allowed(node).earliest_from(time).is_none())
        {
            return None;
        }

        let from = *self.order.last()?;
        let anchor_allowed = next_anchor != last_anchor || self.pending.is_empty();
        let mut options = self
            .pending
            .iter()
            .copied()
            .chain(anchor_allowed.then_some(next_anchor))
            .filter_map(|node| {
                let ready = time.saturating_add(self.instance.transit(from, node));
                let arrival = self.windows.allowed(node).earliest_from(ready)?;
                Some((arrival, node))
            })
            .collect::<Vec<_>>();
        options.sort_unstable();

        for (arrival, node) in options {
            if node == next_anchor {
                self.order.push(node);
                if let Some(schedule) = self.extend(arrival, next_anchor + 1) {
                    return Some(schedule);
                }
                self.order.pop();
                continue;
            }

            let index = self.pending.iter().position(|&pending| pending == node)?;
            self.pending.remove(index);
            self.order.push(node);
            if let Some(schedule) = self.extend(arrival, next_anchor) {
                return Some(schedule);
            }
            self.order.pop();
            self.pending.insert(index, node);
        }
        None
    }
}
