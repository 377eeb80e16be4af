//! Entity use-case services.
//!
//! # Responsibility
//! - Orchestrate store, normalizer, population and cascade per record type.
//! - Keep the request/response layers decoupled from storage details.
//!
//! # Invariants
//! - "Not found" leaves the service as an empty document, never as an error.
//! - Every other store error propagates unchanged; nothing is retried here.

pub mod cascade;
pub mod entity_service;
pub mod error;
pub mod population;
