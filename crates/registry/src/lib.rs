//! Endpoint model and in-memory registry for capbroker.
//!
//! An [`Endpoint`] describes one discoverable capability: a sample operation,
//! a command-line tool found on the search path, or a piece of host context.
//! Every endpoint carries an [`EndpointKind`] that decides how it is executed.
//!
//! The [`Registry`] maps endpoint ids to endpoints. It is shared behind an
//! `Arc` by discovery, dispatch and the boundary layer, and guards its map
//! with a read-write lock so a refresh can run while other callers list or
//! look up endpoints.
//!
//! # Example
//!
//! ```
//! use registry::{Endpoint, EndpointKind, Registry};
//!
//! let registry = Registry::new();
//! let endpoint = Endpoint::new("tool_git", "Git", "Git version control", "Tools")?
//!     .with_parameter("command", "git");
//! registry.register(endpoint);
//!
//! let git = registry.get("tool_git").unwrap();
//! assert_eq!(git.kind, EndpointKind::Tool { command: "git".into() });
//! assert_eq!(registry.count(), 1);
//! # Ok::<(), registry::Error>(())
//! ```

mod endpoint;
mod error;
mod store;

pub use endpoint::{Endpoint, EndpointKind, TOOL_PREFIXES};
pub use error::{Error, Result};
pub use store::Registry;
