pub mod operators;
pub mod password;

pub use operators::OperatorService;
