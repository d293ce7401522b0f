pub mod attendance;
pub mod classrooms;
pub mod common;
pub mod students;

pub use common::{ApiResponse, ErrorCode};
