//! Per-level concurrency limit for research branches.
//!
//! Each call to the orchestrator builds a fresh gate, so nested levels do not
//! share the parent's permits. With limit `L` and `d` levels in flight, up to
//! `L * d` branches may be active at once.

use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 2;

#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Semaphore,
}

impl ConcurrencyGate {
    /// A limit of zero is raised to one so the gate can always make progress
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Semaphore::new(limit.max(1)),
        }
    }

    /// Wait for a slot; the slot is released when the permit drops
    pub async fn enter(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.semaphore.acquire().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_are_returned() {
        let gate = ConcurrencyGate::new(2);
        {
            let _a = gate.enter().await.unwrap();
            let _b = gate.enter().await.unwrap();
            assert_eq!(gate.semaphore.available_permits(), 0);
        }
        assert_eq!(gate.semaphore.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_raised() {
        let gate = ConcurrencyGate::new(0);
        let _permit = gate.enter().await.unwrap();
        assert_eq!(gate.semaphore.available_permits(), 0);
    }
}
