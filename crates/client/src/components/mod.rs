mod app;
pub use app::*;

mod diagnostic_panel;
pub use diagnostic_panel::*;

mod footer;
pub use footer::*;

mod online_check;
pub use online_check::*;

mod reset;
pub use reset::*;

mod pages;
pub use pages::*;
