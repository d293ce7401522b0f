pub mod file_magic;
pub mod multipart;
pub mod parameter_error_handler;
pub mod validate;

pub use file_magic::validate_magic_bytes;
pub use multipart::{FormRejection, SavedPhoto, UploadForm, read_form};
pub use parameter_error_handler::{json_error_handler, path_error_handler, query_error_handler};
pub use validate::validate_display_name;
