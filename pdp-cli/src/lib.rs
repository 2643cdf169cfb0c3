#![deny(missing_docs)]
//! Command-line front end for product page extraction.
//!
//! Bridges the OpenRouter adapter into the extraction core's gateway trait
//! and implements the `extract`, `compare` and `balance` subcommands.

/// Parsers for range-checked options.
pub mod args;
/// Subcommand implementations.
pub mod commands;
/// Error types for the binary.
pub mod errors;
/// [`pdp_extract::gateway::AiGateway`] implementation over OpenRouter.
pub mod gateway;

pub use errors::CliError;
pub use gateway::OpenRouterGateway;
