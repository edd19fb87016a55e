//! sqlift - typed object-query to relational AST translation
//!
//! This crate compiles a typed, object-domain query tree (entities,
//! attribute paths, joins, predicates, functions) into a relational AST
//! suitable for parameterized SQL rendering:
//! - Navigable-path resolution with implicit join synthesis
//! - Scope-aware symbol tables for correlated subqueries
//! - Temporal/duration arithmetic rewriting into interval primitives
//! - Fetch graph planning (join fetch vs. select fetch)
//! - Parameter to placeholder expansion

pub mod config;
pub mod domain;
pub mod metamodel;
pub mod relational;
pub mod translator;
