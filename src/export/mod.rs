//! Rendered-output export

mod wav;

pub use wav::{render_to_wav, write_wav};
