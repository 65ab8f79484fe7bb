//! # CLI Error Type
//!
//! Every command returns `Result<String, CliError>`. The error carries a
//! machine-readable code, which also decides the process exit status, and
//! a message for the terminal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  clap ──── bad flag or value ── usage printed ────► exit        (2)    │
//! │  Cli::into_command ── --from after --to ──────────► Usage       (2)    │
//! │                                                                         │
//! │  BillingService ── CoreError::Validation ─────────► Validation  (65)   │
//! │                 ── CoreError::*NotFound ──────────► NotFound    (66)   │
//! │                 ── InsufficientStock ─────────────► Stock       (65)   │
//! │                 ── duplicate / invoiced / status ─► Conflict    (65)   │
//! │                 ── CoreError::Store ──── error! ──► Storage     (74)   │
//! │                                                                         │
//! │  RenderEngine  ── unknown renderer / format ──────► Usage       (2)    │
//! │                ── pdf / image / panic ── error! ──► Render      (70)   │
//! │  std::fs       ── write failed ───────────────────► Io          (74)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Infrastructure failures are logged with their detail and shown to the
//! user with a generic message. Startup failures (configuration, opening
//! the database) never reach a command and are reported by `main`.

use cotiza_core::CoreError;
use cotiza_render::RenderError;

/// Error returned by CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for CLI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad arguments
    Usage,

    /// Input validation failed
    Validation,

    /// Product, invoice or quotation not found
    NotFound,

    /// Not enough stock for a line
    InsufficientStock,

    /// Duplicate number or code, invoiced quotation, forbidden transition
    Conflict,

    /// Database operation failed
    Storage,

    /// Renderer failed
    Render,

    /// Reading or writing a file failed
    Io,

    /// Unexpected failure inside the CLI itself
    Internal,
}

impl ErrorCode {
    /// Process exit status, following the BSD `sysexits` numbering.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::Usage => 2,
            ErrorCode::Validation | ErrorCode::InsufficientStock | ErrorCode::Conflict => 65,
            ErrorCode::NotFound => 66,
            ErrorCode::Render | ErrorCode::Internal => 70,
            ErrorCode::Storage | ErrorCode::Io => 74,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Usage, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Validation, message)
    }

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::Validation(e) => CliError::validation(e.to_string()),
            CoreError::InsufficientStock { .. } => CliError::new(ErrorCode::InsufficientStock, err.to_string()),
            CoreError::EmptyDocument(_) => CliError::validation(err.to_string()),
            CoreError::Store(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage operation failed: {}", e);
                CliError::new(ErrorCode::Storage, "Database operation failed")
            }
            _ if err.is_not_found() => CliError::new(ErrorCode::NotFound, err.to_string()),
            _ if err.is_conflict() => CliError::new(ErrorCode::Conflict, err.to_string()),
            _ => CliError::validation(err.to_string()),
        }
    }
}

/// Converts render errors to CLI errors.
impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownRenderer(_) | RenderError::UnknownFormat(_) => CliError::usage(err.to_string()),
            other => CliError::new(ErrorCode::Render, other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::Io, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization failed: {}", err);
        CliError::new(ErrorCode::Internal, "Could not serialize output")
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

// =============================================================================
// Unit Tests
// =============================================================================
