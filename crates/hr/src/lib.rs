//! `workify-hr` — HR documents (users, tasks, payroll, reviews) and the
//! state transitions allowed on them.
//!
//! Documents keep their well-known fields typed and carry any other client
//! supplied fields through untouched in a flattened map.

pub mod document;
pub mod payment;
pub mod review;
pub mod task;
pub mod user;

pub use document::Fields;
pub use payment::{NewPayment, Payment};
pub use review::{NewReview, Review};
pub use task::{NewTask, Task, TaskPatch};
pub use user::{NewUser, Toggle, UserProfile};
