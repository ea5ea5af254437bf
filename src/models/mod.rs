pub mod fare;
pub mod place;
pub mod ride;
pub mod route;
pub mod vehicle;
