//! Proof DAGs and the passes that consume them.
pub mod accumulator;
pub mod checker;
pub mod closure;
pub mod generator;
pub mod proof;
pub mod rewrite;
pub mod rule_mapper;
