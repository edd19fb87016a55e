//! End-to-end translation tests: domain statement in, relational AST and
//! parameter bindings out, against a shared commerce mapping model.

mod fixtures;

mod fetch_tests;
mod mutation_tests;
mod parameter_tests;
mod temporal_tests;
