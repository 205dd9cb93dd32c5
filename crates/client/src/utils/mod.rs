pub mod browser;
pub mod fetch;
pub mod page_errors;
pub mod panel;
pub mod touch;
