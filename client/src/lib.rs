//! Terminal client for the churn prediction API.

pub mod api;
pub mod form;
pub mod render;
