//! Registration intake, approval workflow and admin reporting for the E-LIFE
//! self-employment programme.

pub mod access;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod registrations;
pub mod store;
pub mod telemetry;
pub mod validation;
