//! Customer churn prediction service.
//!
//! A pretrained ONNX model scores a customer record; a fixed rule table
//! ([`action`]) turns the probability into a retention recommendation.
//!
//! Endpoints:
//! - `POST /predict_churn` - score one customer
//! - `POST /predict_churn/batch` - score a list of customers
//! - `GET /model_info` - loaded model metadata
//! - `GET /stats` - running counters
//! - `GET /health` - liveness

pub mod action;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod service;

pub use error::{ChurnError, Result};
