//! itinerary-planner core
//!
//! Multi-day single-agent itinerary optimization with time windows, working
//! hours and optional visits.

pub mod error;
pub mod model;
pub mod windows;
pub mod route;
pub mod cost;
pub mod construction;
pub mod search;
pub mod solver;

pub use error::{InstanceError, PlanError};
pub use model::{Instance, InstanceData};
pub use solver::{solve, solve_json, Itinerary, PlannerResult, SolveOptions};
