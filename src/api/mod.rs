pub mod handlers;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod session;
pub mod static_files;

pub use routes::create_router;
pub use session::{AnalyzerFactory, Sessions};
