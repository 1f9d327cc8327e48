// handlers/elevated/mod.rs - Elevated handlers (JWT + role guard)
//
// admin routes run behind require_admin, instructor routes behind
// require_instructor. Both guards put a ValidatedUser into the extensions.
pub mod admin;
pub mod instructor;

pub use admin::delete_user as user_delete;
pub use admin::stats as admin_stats;
pub use admin::status as class_status;
pub use admin::update_user as user_update;

pub use instructor::list as instructor_classes;
pub use instructor::post as class_post;
pub use instructor::update as class_update;
