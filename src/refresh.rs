//! Refresh gate coalescing concurrent 401s into one handshake per wave.

mod metrics;
pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	client::ApiClient,
	error::RefreshError,
	http::{ApiResponse, HttpTransport, RequestDescriptor},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::TokenGrant,
	token::AccessToken,
};

/// Outcome delivered to every member of a refresh wave.
pub(crate) type WaveResult = Result<AccessToken, RefreshError>;

/// Singleflight gate admitting one refresh handshake at a time.
///
/// The first caller to find the gate idle becomes the wave's leader; everyone
/// arriving before the leader settles receives a handle onto the same outcome.
/// Handles settle in enqueue order, each exactly once.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
	phase: Mutex<GatePhase>,
	metrics: RefreshMetrics,
}

#[derive(Debug, Default)]
enum GatePhase {
	/// No refresh in flight.
	#[default]
	Idle,
	/// A leader owns the handshake; queued senders settle in push order.
	Refreshing { waiters: Vec<oneshot::Sender<WaveResult>> },
}

/// Admission decision handed to a caller entering the gate.
pub(crate) enum GateEntry {
	/// Caller performs the handshake and settles the wave through the guard.
	Leader(LeaderGuard),
	/// Caller suspends until the leader settles the wave.
	Follower(oneshot::Receiver<WaveResult>),
}

impl RefreshGate {
	/// Joins the wave in flight, or opens a new one.
	///
	/// The phase lock is synchronous, so the check and the transition happen
	/// atomically: two callers can never both observe `Idle`.
	pub(crate) fn enter(self: &Arc<Self>) -> GateEntry {
		let mut phase = self.phase.lock();

		match &mut *phase {
			GatePhase::Idle => {
				*phase = GatePhase::Refreshing { waiters: Vec::new() };
				self.metrics.record_attempt();

				GateEntry::Leader(LeaderGuard { gate: Some(Arc::clone(self)) })
			},
			GatePhase::Refreshing { waiters } => {
				let (tx, rx) = oneshot::channel();

				waiters.push(tx);
				self.metrics.record_coalesced();

				GateEntry::Follower(rx)
			},
		}
	}

	/// Counters describing the gate's activity so far.
	pub(crate) fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns the gate to idle and settles every waiter in enqueue order.
	fn finish(&self, result: &WaveResult) {
		let waiters = match mem::take(&mut *self.phase.lock()) {
			GatePhase::Refreshing { waiters } => waiters,
			GatePhase::Idle => Vec::new(),
		};

		match result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		for waiter in waiters {
			// A follower that gave up has dropped its receiver; the send to it
			// simply misses while the rest of the wave still settles.
			let _ = waiter.send(result.clone());
		}
	}
}

/// Settles the wave exactly once, even if the leading future is dropped.
pub(crate) struct LeaderGuard {
	gate: Option<Arc<RefreshGate>>,
}
impl LeaderGuard {
	/// Consumes the guard, delivering `result` to the whole wave.
	pub(crate) fn settle(mut self, result: &WaveResult) {
		if let Some(gate) = self.gate.take() {
			gate.finish(result);
		}
	}
}
impl Drop for LeaderGuard {
	fn drop(&mut self) {
		if let Some(gate) = self.gate.take() {
			gate.finish(&Err(RefreshError::Interrupted));
		}
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Obtains a fresh access token, coalescing concurrent callers into one
	/// handshake.
	///
	/// The leader performs the wire refresh; followers suspend on their wave
	/// handle and receive the same outcome. On success the fresh token is
	/// installed and persisted before any waiter wakes, so a replayed request
	/// never races a stale token. On failure the local session is cleared
	/// first, and a definitive rejection also erases the durable snapshot.
	pub(crate) async fn refresh_access_token(&self) -> Result<AccessToken, RefreshError> {
		match self.gate.enter() {
			GateEntry::Leader(guard) => {
				const KIND: OpKind = OpKind::Refresh;

				let span = OpSpan::new(KIND, "refresh_access_token");

				obs::record_op_outcome(KIND, OpOutcome::Attempt);

				let outcome = span.instrument(self.perform_refresh()).await;

				match &outcome {
					Ok(token) => {
						self.install_token(Some(token.clone()));
						self.persist_token_advisory(token).await;
						obs::record_op_outcome(KIND, OpOutcome::Success);
					},
					Err(e) => {
						self.clear_local_session();

						if e.is_definitive() {
							self.erase_snapshot_advisory().await;
						}

						obs::record_op_outcome(KIND, OpOutcome::Failure);
					},
				}

				guard.settle(&outcome);

				outcome
			},
			GateEntry::Follower(handle) => handle.await.unwrap_or(Err(RefreshError::Interrupted)),
		}
	}

	/// Runs the wire handshake against the descriptor's refresh route.
	///
	/// The call authenticates with the ambient cookie carried by the
	/// transport, never with the bearer token that just failed.
	async fn perform_refresh(&self) -> Result<AccessToken, RefreshError> {
		let request = RequestDescriptor::post(self.descriptor.auth_routes.refresh.clone())
			.timeout(self.descriptor.refresh_timeout)
			.resolve(&self.descriptor, None)
			.map_err(|e| RefreshError::Build { message: e.to_string() })?;
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| RefreshError::Transit { message: e.to_string() })?;
		let response = ApiResponse::from_http(response);

		if !response.is_success() {
			return Err(RefreshError::Rejected {
				status: response.status().as_u16(),
				reason: response
					.error_message()
					.unwrap_or_else(|| "backend returned no error message".into()),
			});
		}

		let grant = response
			.json::<TokenGrant>("refresh response")
			.map_err(|e| RefreshError::Malformed { message: e.to_string() })?;

		Ok(AccessToken::new(grant.access_token))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn leader(gate: &Arc<RefreshGate>) -> LeaderGuard {
		match gate.enter() {
			GateEntry::Leader(guard) => guard,
			GateEntry::Follower(_) => panic!("Gate should be idle here."),
		}
	}

	fn follower(gate: &Arc<RefreshGate>) -> oneshot::Receiver<WaveResult> {
		match gate.enter() {
			GateEntry::Leader(_) => panic!("Gate should already have a leader."),
			GateEntry::Follower(handle) => handle,
		}
	}

	#[test]
	fn first_caller_leads_and_later_callers_queue() {
		let gate = Arc::new(RefreshGate::default());
		let guard = leader(&gate);
		let mut early = follower(&gate);
		let mut late = follower(&gate);

		assert_eq!(gate.metrics().attempts(), 1);
		assert_eq!(gate.metrics().coalesced_waiters(), 2);

		guard.settle(&Ok(AccessToken::new("fresh")));

		let delivered = Ok(AccessToken::new("fresh"));

		assert_eq!(early.try_recv().expect("Settled wave should reach the first waiter."), delivered);
		assert_eq!(late.try_recv().expect("Settled wave should reach the second waiter."), delivered);
		assert_eq!(gate.metrics().successes(), 1);
	}

	#[test]
	fn settled_gate_admits_a_new_leader() {
		let gate = Arc::new(RefreshGate::default());

		leader(&gate).settle(&Err(RefreshError::Interrupted));

		assert!(matches!(gate.enter(), GateEntry::Leader(_)));
		assert_eq!(gate.metrics().attempts(), 2);
	}

	#[test]
	fn dropped_leader_rejects_the_wave() {
		let gate = Arc::new(RefreshGate::default());
		let guard = leader(&gate);
		let mut handle = follower(&gate);

		drop(guard);

		assert_eq!(
			handle.try_recv().expect("Dropped leader should still settle the wave."),
			Err(RefreshError::Interrupted),
		);
		assert_eq!(gate.metrics().failures(), 1);
		assert!(matches!(gate.enter(), GateEntry::Leader(_)));
	}

	#[test]
	fn settle_consumes_the_guard_without_a_second_finish() {
		let gate = Arc::new(RefreshGate::default());

		leader(&gate).settle(&Ok(AccessToken::new("once")));

		assert_eq!(gate.metrics().successes(), 1);
		assert_eq!(gate.metrics().failures(), 0);
	}
}
