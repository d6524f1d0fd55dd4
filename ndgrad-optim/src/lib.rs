//! Training utilities for [`ndgrad`] graphs: cost functions, two regression
//! models and a plain gradient-descent loop.

pub mod cost;
pub mod models;
pub mod result;
pub mod sgd;

pub use cost::{cost_value, cross_entropy, squared_error, CostFn};
pub use models::{LinearRegression, LogisticRegression};
pub use result::{OptimResult, TerminationReason};
pub use sgd::{evaluate, sgd, Sgd, SgdConfig};
