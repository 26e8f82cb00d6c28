pub mod register;
pub mod sim;
