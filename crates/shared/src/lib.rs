pub mod domain;
pub mod error;
pub mod tasks;
pub mod validation;
