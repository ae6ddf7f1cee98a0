pub mod errors;
pub mod journey;
pub mod raptor;
pub mod request;
pub mod transfers;
pub mod transit;
