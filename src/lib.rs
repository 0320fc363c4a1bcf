pub mod configuration;
pub mod console;
pub mod domain;
pub mod error;
pub mod services;
pub mod startup;
