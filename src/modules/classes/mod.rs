pub mod controller;
pub mod router;
pub mod service;

pub use router::init_classes_router;
pub use service::class_access;
