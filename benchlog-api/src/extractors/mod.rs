//! Custom extractors.
//!
//! Both reject with the standard `{code, message, details}` body and a 400,
//! where axum's stock extractors would answer 422 or plain text.

mod json_body;
mod path_id;

pub use json_body::JsonBody;
pub use path_id::{PathId, PathIdError};
