#![allow(dead_code)]

pub use hybrid_dag_test_utils::builders;
pub use hybrid_dag_test_utils::fake_agents;
pub use hybrid_dag_test_utils::fake_guards;
pub use hybrid_dag_test_utils::{init_tracing, with_timeout};
