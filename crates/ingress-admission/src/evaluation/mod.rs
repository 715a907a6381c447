pub mod errors;
mod evaluator;

pub use evaluator::PolicyEvaluator;
