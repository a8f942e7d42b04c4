pub(crate) mod json;
pub mod token;

pub use json::{ErrorCode, JsonResponse};
