pub mod backend;
mod error;
pub mod gradio;
pub mod http;
pub mod normalize;
pub mod types;

pub use backend::ImageBackend;
pub use error::{PictorError, Result};
pub use gradio::{GradioClient, SPACE_ID};
pub use http::{RelayState, router};
pub use types::{GenerateRequest, GenerateResponse, ImageHandle, ImageRef};
