//! Common utilities and shared types for Matrix.
//!
//! This crate provides foundational components used across all Matrix crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Auth tokens**: JWT issuance and verification via [`JwtService`]
//! - **Pagination**: 1-based page requests via [`PageRequest`] and [`Paged`]
//! - **Storage**: File storage backends for article attachments
//!
//! # Example
//!
//! ```no_run
//! use matrix_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod jwt;
pub mod pagination;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use jwt::{Claims, JwtService};
pub use pagination::{PageRequest, Paged};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
