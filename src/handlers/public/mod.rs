// handlers/public/mod.rs - Public handlers (no authentication required)
pub mod classes;
pub mod instructors;
pub mod root;
pub mod token;
pub mod users;

pub use root::health;
pub use root::root;
pub use token::post as set_token;

pub use users::get as user_get;
pub use users::list as users_list;
pub use users::post as user_post;

pub use classes::approved as classes_approved;
pub use classes::get as class_get;
pub use classes::list as classes_manage;
pub use classes::popular as classes_popular;

pub use instructors::application as instructor_application;
pub use instructors::apply as instructor_apply;
pub use instructors::list as instructors_list;
pub use instructors::popular as instructors_popular;
