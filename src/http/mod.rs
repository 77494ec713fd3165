pub mod response;
pub mod server;

pub use response::Response;
pub use server::Server;
