pub mod diagnostics;
pub mod error;
pub mod package;
pub mod platform;
pub mod reset;
pub mod utils;
pub mod worker;

pub use package::*;

#[cfg(feature = "build")]
pub use utils::native::{configure_tracing, load_dotenv};
