pub mod admin_use_case;
pub mod submit_use_case;

pub use admin_use_case::{AdminUpdate, AdminUseCase};
pub use submit_use_case::SubmitUseCase;
