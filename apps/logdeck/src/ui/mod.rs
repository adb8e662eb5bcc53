pub mod clipboard;
pub mod dashboard;
pub mod dispatch;
pub mod runtime;
