//! Core domain entities
//!
//! Pure data structures and the role resolver - no I/O.

mod login_record;
pub mod result;
pub mod role;
mod user;

pub use login_record::LoginRecord;
pub use role::{is_admin, is_teacher, HasRoles, Role};
pub use user::{Registration, SessionUser, User};
