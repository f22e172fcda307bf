pub mod controls;
pub mod http;
pub mod operator;
