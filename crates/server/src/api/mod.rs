pub mod audit;
pub mod defects;
pub mod handlers;
pub mod middleware;
pub mod objects;
pub mod projects;
pub mod routes;
pub mod tickets;
pub mod users;

pub use routes::create_router;
