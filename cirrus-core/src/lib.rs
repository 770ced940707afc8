//! Cirrus Core
//!
//! Core library for a declarative infrastructure tool: the resource model,
//! attribute schemas, the provider contract, a generic state-change waiter,
//! and the diff / plan / apply pipeline.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod waiter;
