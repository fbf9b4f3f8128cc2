//! REST API client module for the Negobi backend.
//!
//! This module provides the `ApiClient` and the pieces it is built from:
//! request/response interception, response envelopes and error mapping.
//!
//! Authenticated requests carry `Authorization: Bearer <token>`,
//! `x-api-key` and a `language` header taken from the credential store.

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod interceptor;

pub use auth::{LoginData, OtpData};
pub use client::{ApiClient, ClientSettings, DEFAULT_API_BASE_URL};
pub use envelope::{Ack, ListQuery, Mutation, Page};
pub use error::ApiError;
pub use interceptor::{classify, Disposition, RequestInterceptor, SessionGuard};
