//! Itinerary planner entry point.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::construction::all_unperformed;
use crate::cost::{Cost, CostEvaluator};
use crate::error::PlanError;
use crate::model::{Category, Instance};
use crate::search::{Deadline, LocalSearch, SolveStats};
use crate::windows::DayWindows;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Search budget. `None` uses the budget recorded in the instance.
    pub time_limit: Option<Duration>,
    /// Scale of the guided penalty term relative to the average arc cost of
    /// the first local optimum.
    pub gls_lambda_coefficient: f64,
    /// Cost per time unit spent waiting right before the final anchor.
    pub trailing_idle_weight: i64,
    /// Score candidate moves on rayon worker threads.
    pub parallel_evaluation: bool,
    /// Let events with a positive penalty be dropped like regular locations.
    pub droppable_events: bool,
    /// Stop after this many neighbourhood passes even if time remains.
    pub max_iterations: Option<usize>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            gls_lambda_coefficient: 0.1,
            trailing_idle_weight: 0,
            parallel_evaluation: true,
            droppable_events: false,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledVisit {
    pub node: usize,
    pub category: Category,
    pub earliest_arrival: i64,
    pub latest_arrival: i64,
}

#[derive(Debug, Clone)]
pub struct PlannerResult {
    /// Visits in route order, from the first day's start anchor to the last
    /// day's end anchor.
    pub scheduled: Vec<ScheduledVisit>,
    /// Optional locations left out, by node index.
    pub dropped: Vec<usize>,
    pub cost: Cost,
    pub stats: SolveStats,
}

/// Result record handed to an external presenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Itinerary {
    pub dropped_locations: Vec<Value>,
    pub scheduled_locations: Vec<Value>,
}

impl PlannerResult {
    /// Maps the result back onto the instance's location payloads.
    ///
    /// Object payloads gain `earliestArrivalTime` and `latestArrivalTime`;
    /// any other payload is wrapped as `{"location": payload, ...}`.
    pub fn itinerary(&self, instance: &Instance) -> Itinerary {
        let dropped_locations = self
            .dropped
            .iter()
            .map(|&node| instance.payload(node).clone())
            .collect();

        let scheduled_locations = self
            .scheduled
            .iter()
            .map(|visit| {
                let mut fields = match instance.payload(visit.node).clone() {
                    Value::Object(fields) => fields,
                    other => {
                        let mut wrapped = Map::new();
                        wrapped.insert("location".to_string(), other);
                        wrapped
                    }
                };
                fields.insert("earliestArrivalTime".to_string(), visit.earliest_arrival.into());
                fields.insert("latestArrivalTime".to_string(), visit.latest_arrival.into());
                Value::Object(fields)
            })
            .collect();

        Itinerary {
            dropped_locations,
            scheduled_locations,
        }
    }
}

/// Plans a multi-day itinerary for `instance`.
///
/// Dropping optional locations is a successful outcome; the only failure
/// after loading is [`PlanError::NoFeasibleSolution`], when the anchors and
/// mandatory locations cannot be scheduled together.
pub fn solve(instance: &Instance, options: SolveOptions) -> Result<PlannerResult, PlanError> {
    let budget = options.time_limit.unwrap_or_else(|| instance.budget());
    let deadline = Deadline::after(budget);
    info!(
        nodes = instance.len(),
        days = instance.days(),
        events = instance.events(),
        budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        "planning itinerary"
    );

    let windows = DayWindows::restrict(instance);
    let optional = (0..instance.len())
        .map(|node| instance.is_optional(node, options.droppable_events))
        .collect::<Vec<_>>();
    let evaluator = CostEvaluator::new(instance, options.trailing_idle_weight);

    let seed = all_unperformed(instance, &windows, &optional, &evaluator)?;
    let (best, stats) = LocalSearch::new(instance, &windows, &optional, evaluator, &options)
        .run(seed, &deadline);

    let scheduled = best
        .route
        .order()
        .iter()
        .zip(best.schedule.arrivals())
        .map(|(&node, arrival)| ScheduledVisit {
            node,
            category: instance.category(node),
            earliest_arrival: arrival.start,
            latest_arrival: arrival.end,
        })
        .collect::<Vec<_>>();
    let dropped = best.route.skipped().collect::<Vec<_>>();

    info!(
        cost = best.cost,
        visited = scheduled.len(),
        dropped = dropped.len(),
        iterations = stats.iterations,
        penalty_updates = stats.penalty_updates,
        "itinerary planned"
    );

    Ok(PlannerResult {
        scheduled,
        dropped,
        cost: best.cost,
        stats,
    })
}

/// Parses a JSON instance, plans it and returns the presenter record.
pub fn solve_json(json: &str, options: SolveOptions) -> Result<Itinerary, PlanError> {
    let instance = Instance::from_json(json)?;
    let result = solve(&instance, options)?;
    Ok(result.itinerary(&instance))
}
