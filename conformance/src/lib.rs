pub mod case;
pub mod compare;
pub mod config;
pub mod discover;
pub mod errors;
pub mod normalize;
pub mod stage;
pub mod suite;

pub use case::TestCase;
pub use config::SuiteConfig;
pub use suite::{run_suite, RunOptions, SuiteKind, SuiteReport};
