//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage, pipeline and AI calls into use-case level APIs.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod canvas_service;
pub mod desktop_service;
