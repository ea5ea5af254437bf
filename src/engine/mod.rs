pub mod dispatch;
pub mod fare;
pub mod locator;
pub mod orchestrator;
pub mod ride_request;
pub mod standalone;
