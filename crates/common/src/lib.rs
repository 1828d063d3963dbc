//! Client library for the Deep Discovery Analyzer sample upload API.
//!
//! # Modules
//!
//! - [`archive`]: Sample archive packaging for `upload_sample`
//! - [`client`]: Endpoint calls against one analyzer
//! - [`constants`]: Header names, endpoint paths and defaults
//! - [`error`]: Error types and error handling utilities
//! - [`hash`]: SHA1 helpers for samples and archives
//! - [`headers`]: Ordered header collection
//! - [`identity`]: Client identity sent with every registration
//! - [`logging`]: Logger setup
//! - [`multipart`]: `multipart/form-data` encoding
//! - [`report`]: Report types and XML to JSON mapping
//! - [`request_signing`]: `X-DTAS` challenge and checksum signing
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and mocks
//! - [`transport`]: HTTP transport abstraction

pub mod archive;
pub mod client;
pub mod constants;
pub mod error;
pub mod hash;
pub mod headers;
pub mod identity;
pub mod logging;
pub mod multipart;
pub mod report;
pub mod request_signing;
pub mod settings;
pub mod transport;

pub use client::DdanClient;
pub use error::DdanError;
pub use report::ReportType;
pub use settings::Settings;
