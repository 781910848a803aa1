//! Event publisher port — fan-out for engine events.

use std::future::Future;

use relay_domain::error::RelayError;
use relay_domain::event::Event;

/// Publish engine events to whoever is listening.
pub trait EventPublisher {
    /// Publish an event. Must succeed even with zero subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), RelayError>> + Send;
}
