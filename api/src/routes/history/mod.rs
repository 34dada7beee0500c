pub mod history_response;
pub mod history_route;
