//! Library crate for galaxy-quiz-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod state;
