mod home;
pub use home::*;

mod notifications;
pub use notifications::*;

mod settings;
pub use settings::*;

mod debug;
pub use debug::*;
