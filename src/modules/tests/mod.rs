pub mod router;
pub mod service;

pub use router::init_tests_router;
