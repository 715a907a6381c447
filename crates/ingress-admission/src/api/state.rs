use std::sync::Arc;

use crate::evaluation::PolicyEvaluator;

pub(crate) struct ApiServerState {
    pub(crate) evaluator: Arc<PolicyEvaluator>,
    pub(crate) version: String,
}
