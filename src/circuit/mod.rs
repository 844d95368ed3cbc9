pub mod breaker;
pub mod evaluator;
pub mod state;
pub mod transitions;
