//! # Bootstrap
//!
//! Startup readiness coordination for the portal.
//!
//! A session launches every registered subsystem, collects exactly one
//! terminal outcome from each, folds fetched external data into the canonical
//! settings and flips to [`Phase::Ready`] once, when every *required*
//! subsystem has succeeded. Optional failures only surface as
//! [`BootstrapEvent::Degraded`].
//!
//! ## Flow
//!
//! 1. [`Bootstrap::start`] launches the [`Stage::Immediate`] subsystems.
//! 2. The `settings` subsystem delivers the base document; the coordinator
//!    publishes it and launches the [`Stage::AfterSettings`] subsystems with
//!    that snapshot.
//! 3. Every external batch is merged with [`portal_settings::merge`] and the
//!    new snapshot is published.
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_bootstrap::Bootstrap;
//! use portal_fetcher::HttpTransport;
//!
//! let transport = Arc::new(HttpTransport::new(&config.fetch)?);
//! let bootstrap = Bootstrap::from_config(&config, transport)?;
//! bootstrap.start()?;
//! if bootstrap.wait_ready().await {
//!     let settings = bootstrap.current_settings();
//! }
//! ```

mod channel;
mod coordinator;
mod error;
mod events;
mod handle;
mod launcher;
pub mod launchers;

pub use crate::channel::{Completion, Outcome, Payload, TaskReporter};
pub use crate::error::BootstrapError;
pub use crate::events::{BootstrapEvent, EventReceiver, Phase};
pub use crate::handle::{Bootstrap, BootstrapBuilder};
pub use crate::launcher::{LaunchContext, LaunchFuture, Launcher, Stage};
pub use crate::launchers::standard_launchers;
