//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business
//! operations and orchestrate interactions between different parts of the
//! application, such as user registration and media uploads.

pub mod media_service;
pub mod user_service;
