// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind jwt_auth_middleware, which puts the caller's
// AuthUser into the request extensions.
pub mod cart;
pub mod enrollments;
pub mod payments;
pub mod users;

pub use users::get as user_by_email;

pub use cart::delete as cart_item_delete;
pub use cart::item as cart_item_get;
pub use cart::list as cart_list;
pub use cart::post as cart_add;

pub use payments::history as payment_history;
pub use payments::history_length as payment_history_length;
pub use payments::post as payment_post;

pub use enrollments::list as enrolled_classes;
