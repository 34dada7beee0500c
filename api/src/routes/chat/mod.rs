pub mod chat_request;
pub mod chat_route;
