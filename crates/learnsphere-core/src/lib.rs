//! Course progress, quiz scoring, badges and reporting.
//!
//! This crate holds the learning rules of LearnSphere: the validated course
//! catalog, per-learner lesson progress, attempt-decay quiz rewards, badge
//! tiers and the administrative reporting rows built on top of them.

pub mod badges;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod parser;
pub mod profile;
pub mod progress;
pub mod quiz;
pub mod reporting;
