#![forbid(unsafe_code)]

//! Idea validator daemon: HTTP endpoint, remote model client and the
//! per-request validation pipeline.

pub mod config;
pub mod http;
pub mod llm;
pub mod service;
