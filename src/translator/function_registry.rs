//! Known scalar function registry.
//!
//! Maps well-known function names (lowercase for lookup) to their return
//! type descriptors; the type-inference stack consults this when a function
//! call sits next to an untyped literal or parameter. Functions missing
//! from the registry translate fine, they just carry no resolved type.

use std::collections::HashMap;

use crate::metamodel::JdbcType;

/// Return-type entry for one known function.
#[derive(Clone, Copy)]
pub struct FunctionSignature {
    pub returns: JdbcType,
}

/// Look up the return type of a known scalar function.
pub fn function_return_type(name: &str) -> Option<JdbcType> {
    let lower = name.to_lowercase();
    KNOWN_FUNCTIONS.get(lower.as_str()).map(|sig| sig.returns)
}

lazy_static::lazy_static! {
    static ref KNOWN_FUNCTIONS: HashMap<&'static str, FunctionSignature> = {
        let mut m = HashMap::new();

        // String functions
        m.insert("upper", FunctionSignature { returns: JdbcType::Varchar });
        m.insert("lower", FunctionSignature { returns: JdbcType::Varchar });
        m.insert("trim", FunctionSignature { returns: JdbcType::Varchar });
        m.insert("substring", FunctionSignature { returns: JdbcType::Varchar });
        m.insert("concat", FunctionSignature { returns: JdbcType::Varchar });
        m.insert("length", FunctionSignature { returns: JdbcType::Integer });
        m.insert("locate", FunctionSignature { returns: JdbcType::Integer });

        // Numeric functions
        m.insert("abs", FunctionSignature { returns: JdbcType::Double });
        m.insert("sqrt", FunctionSignature { returns: JdbcType::Double });
        m.insert("mod", FunctionSignature { returns: JdbcType::Integer });
        m.insert("floor", FunctionSignature { returns: JdbcType::BigInt });
        m.insert("ceiling", FunctionSignature { returns: JdbcType::BigInt });

        // Aggregates
        m.insert("count", FunctionSignature { returns: JdbcType::BigInt });
        m.insert("sum", FunctionSignature { returns: JdbcType::Double });
        m.insert("avg", FunctionSignature { returns: JdbcType::Double });

        // Temporal functions
        m.insert("current_date", FunctionSignature { returns: JdbcType::Date });
        m.insert("current_time", FunctionSignature { returns: JdbcType::Time });
        m.insert("current_timestamp", FunctionSignature { returns: JdbcType::Timestamp });

        // Boolean-valued
        m.insert("exists", FunctionSignature { returns: JdbcType::Boolean });

        m
    };
}
