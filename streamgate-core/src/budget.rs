//! Shared credit pools drawn on by sessions across workers.
//!
//! Implements: REQ-BGT-001 (Shared Budget Pools)
//!
//! A `budget_id` on a Data or Window frame names a pool of credit shared by
//! multiple streams, bounding their combined memory/throughput allotment.
//! Sessions are single-threaded but pools are not: different workers draw
//! from one pool, so claim/release are lock-free atomics. `budget_id` 0
//! means unbudgeted and never reaches a pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::frame::BudgetId;

/// One shared credit pool.
///
/// Credit is claimed before a reservation is forwarded and released when the
/// downstream acknowledges. A failed claim is resource exhaustion and is
/// handled by the session like a window violation.
#[derive(Debug)]
pub struct BudgetPool {
    credit: AtomicU64,
}

impl BudgetPool {
    /// A pool holding `initial` units of credit.
    pub fn new(initial: u64) -> Self {
        Self {
            credit: AtomicU64::new(initial),
        }
    }

    /// Units currently claimable.
    pub fn available(&self) -> u64 {
        self.credit.load(Ordering::Acquire)
    }

    /// Claim `amount` units; returns `false` without side effects when the
    /// pool cannot cover them.
    pub fn claim(&self, amount: u32) -> bool {
        let amount = u64::from(amount);
        self.credit
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |credit| {
                credit.checked_sub(amount)
            })
            .is_ok()
    }

    /// Return `amount` units to the pool.
    pub fn release(&self, amount: u32) {
        self.credit.fetch_add(u64::from(amount), Ordering::AcqRel);
    }
}

/// Cross-worker registry of budget pools keyed by budget id.
#[derive(Debug, Default)]
pub struct BudgetRegistry {
    pools: DashMap<BudgetId, Arc<BudgetPool>>,
}

impl BudgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool for `budget_id`, created with `initial` credit on first use.
    ///
    /// Callers must not pass `budget_id` 0; unbudgeted halves never consult
    /// the registry.
    pub fn supply(&self, budget_id: BudgetId, initial: u64) -> Arc<BudgetPool> {
        debug_assert_ne!(budget_id, 0);
        self.pools
            .entry(budget_id)
            .or_insert_with(|| Arc::new(BudgetPool::new(initial)))
            .value()
            .clone()
    }

    /// The pool for `budget_id`, if one exists.
    pub fn get(&self, budget_id: BudgetId) -> Option<Arc<BudgetPool>> {
        self.pools.get(&budget_id).map(|entry| entry.value().clone())
    }

    /// Drop the pool for `budget_id`; outstanding `Arc`s stay valid.
    pub fn remove(&self, budget_id: BudgetId) -> bool {
        self.pools.remove(&budget_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: claim succeeds while credit covers, then refuses.
    #[test]
    fn test_claim_and_exhaustion() {
        let pool = BudgetPool::new(100);

        assert!(pool.claim(60));
        assert_eq!(pool.available(), 40);

        // Refused claim leaves the pool untouched.
        assert!(!pool.claim(50));
        assert_eq!(pool.available(), 40);

        assert!(pool.claim(40));
        assert_eq!(pool.available(), 0);
    }

    /// Test: release restores claimable credit.
    #[test]
    fn test_release() {
        let pool = BudgetPool::new(10);
        assert!(pool.claim(10));
        pool.release(4);
        assert!(pool.claim(4));
        assert!(!pool.claim(1));
    }

    /// Test: registry hands out one shared pool per id.
    #[test]
    fn test_registry_shares_pools() {
        let registry = BudgetRegistry::new();

        let a = registry.supply(7, 100);
        let b = registry.supply(7, 999);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.available(), 100);

        a.claim(30);
        assert_eq!(registry.get(7).unwrap().available(), 70);

        assert!(registry.remove(7));
        assert!(registry.get(7).is_none());
        // Outstanding handles survive removal.
        assert_eq!(b.available(), 70);
    }

    /// Test: concurrent claims never overdraw the pool.
    #[test]
    fn test_concurrent_claims_bounded() {
        let pool = Arc::new(BudgetPool::new(1000));
        let mut claimed = Vec::new();

        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..8 {
                let pool = Arc::clone(&pool);
                handles.push(scope.spawn(move || {
                    let mut granted = 0u64;
                    for _ in 0..1000 {
                        if pool.claim(1) {
                            granted += 1;
                        }
                    }
                    granted
                }));
            }
            for handle in handles {
                claimed.push(handle.join().unwrap());
            }
        });

        assert_eq!(claimed.iter().sum::<u64>(), 1000);
        assert_eq!(pool.available(), 0);
    }
}
