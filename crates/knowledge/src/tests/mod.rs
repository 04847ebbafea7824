//! End-to-end tests for ingestion, retrieval and fallback negotiation.

mod scenarios;
