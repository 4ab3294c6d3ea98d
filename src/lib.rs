pub mod database_ops;
pub mod error;
pub mod progress;
pub mod provider;
pub mod sync;
pub mod telemetry;

pub mod util {
    pub mod env;
}
