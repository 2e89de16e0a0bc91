//! Turns a layer's metrics, attribution and correlation into ranked advice.
//!
//! Rules live in a table (see [`rules::default_rules`]); the [`Recommender`]
//! evaluates every entry and sorts whatever fires by impact, then severity.

pub mod engine;
pub mod recommendation;
pub mod rules;

pub use engine::Recommender;
pub use recommendation::{Impact, OptimizationRecommendation, RecommendationType};
pub use rules::{default_rules, Rule, RuleContext, Trigger};
