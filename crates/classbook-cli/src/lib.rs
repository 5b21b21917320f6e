//! # Classbook CLI
//!
//! Staff provisioning for Classbook. These operations create the users,
//! schools and classes the policy engine later reasons about, so they go
//! straight to the [`Store`](classbook_authz::Store) without an actor.
//!
//! ## Usage
//!
//! ```ignore
//! use classbook_cli::provision::{self, NewUser};
//!
//! let manager = provision::create_user(&store, new_user, now).await?;
//! let school = provision::create_school(&store, "Hilltop".into(), Some(manager.id), now).await?;
//! ```

pub mod provision;
