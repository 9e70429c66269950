pub mod handlers;
pub mod middleware;
pub mod projects;
pub mod routes;
pub mod tasks;
pub mod ws;

pub use routes::create_router;
