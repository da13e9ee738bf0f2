//! Ten News - ten random Hacker News stories
//!
//! This crate serves a single page listing a random sample of the current top
//! stories, ranked by score, with each author's karma and the publish date.

pub mod client;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod sampler;
pub mod session;
