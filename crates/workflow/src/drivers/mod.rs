pub mod responder;
pub mod wordpress;
