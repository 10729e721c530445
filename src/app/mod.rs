#[allow(clippy::module_inception)]
mod app;
mod handler;

pub use handler::AppHandler;
