//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_broker.op` with the `op` (operation)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `bearer_broker_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, store::StoreError};

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Authenticated request path, including 401 handling.
	Request,
	/// Token refresh handshake.
	Refresh,
	/// Credential exchange.
	Login,
	/// Session teardown.
	Logout,
	/// Session rehydration on startup.
	Bootstrap,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Refresh => "refresh",
			OpKind::Login => "login",
			OpKind::Logout => "logout",
			OpKind::Bootstrap => "bootstrap",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a store failure on a path where persistence is advisory.
///
/// The session keeps working from memory; the degradation surfaces through the
/// `tracing`/`metrics` features instead of failing the caller's operation.
pub(crate) fn record_store_degraded(context: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(context, %error, "token store degraded, continuing with the in-memory session");
	#[cfg(feature = "metrics")]
	::metrics::counter!("bearer_broker_store_degraded_total", "context" => context).increment(1);

	#[cfg(not(feature = "tracing"))]
	let _ = error;
	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	let _ = context;
}
