//! Id Generator Port
//!
//! Produces the opaque `requestid` values stamped on outbound envelopes.

/// Source of unique request identifiers.
///
/// Any `Fn() -> String` closure is an `IdGenerator`, which keeps tests
/// deterministic without a dedicated fake.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Return a fresh identifier.
    fn next_id(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn closure_is_an_id_generator() {
        let counter = AtomicU32::new(0);
        let ids = move || format!("req-{}", counter.fetch_add(1, Ordering::Relaxed));

        assert_eq!(ids.next_id(), "req-0");
        assert_eq!(ids.next_id(), "req-1");
    }

    #[test]
    fn mock_generator_returns_configured_ids() {
        let mut ids = MockIdGenerator::new();
        ids.expect_next_id()
            .times(2)
            .returning(|| "fixed".to_string());

        assert_eq!(ids.next_id(), "fixed");
        assert_eq!(ids.next_id(), "fixed");
    }
}
