pub mod cart_service;
pub mod class_service;
pub mod enrollment_service;

pub use cart_service::CartService;
pub use class_service::{AdminStats, ClassService, PopularInstructor};
pub use enrollment_service::{EnrolledClass, EnrollmentService, PaymentOutcome};
