
pub mod execution_engine;
pub mod rolling;

pub use execution_engine::ExecutionEngine;
pub use rolling::RollingPolicy;
