use courier_core::config::{PoolConfig, Strategy};
use courier_core::notify::entity::{SendContext, Selectable};
use courier_core::notify::error::NotifyError;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// # Summary
/// Picks one enabled account per send from a pool.
///
/// # Invariants
/// - `enabled` is never empty after construction.
/// - `weights[i]` is the effective weight of `enabled[i]` and is always >= 1.
/// - The round-robin counter is only touched inside `select` and is lock-free.
pub struct Selector<A> {
    accounts: Vec<A>,
    enabled: Vec<usize>,
    weights: Vec<u64>,
    total_weight: u64,
    strategy: Strategy,
    counter: AtomicUsize,
}

impl<A: Selectable> Selector<A> {
    /// # Summary
    /// Builds a selector over `accounts`.
    ///
    /// # Logic
    /// 1. Filters out disabled accounts, keeping insertion order.
    /// 2. Rejects the pool if nothing remains enabled.
    /// 3. Normalises zero weights to 1 and reports each one.
    ///
    /// # Returns
    /// * `NotifyError::Config` when no account is enabled.
    pub fn new(strategy: Strategy, accounts: Vec<A>) -> Result<Self, NotifyError> {
        let enabled: Vec<usize> = accounts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_enabled())
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return Err(NotifyError::Config("no available account".to_string()));
        }

        let weights: Vec<u64> = enabled
            .iter()
            .filter_map(|&i| accounts.get(i))
            .map(|a| match a.weight() {
                0 => {
                    warn!(account = a.name(), "account weight is 0, treating it as 1");
                    1
                }
                w => u64::from(w),
            })
            .collect();
        let total_weight = weights.iter().sum();

        Ok(Self {
            accounts,
            enabled,
            weights,
            total_weight,
            strategy,
            counter: AtomicUsize::new(0),
        })
    }

    /// # Summary
    /// Builds a selector from a pool configuration.
    ///
    /// # Returns
    /// * `NotifyError::Config` when the pool is disabled or has no enabled account.
    pub fn from_pool(pool: PoolConfig<A>) -> Result<Self, NotifyError> {
        if pool.disabled {
            return Err(NotifyError::Config("provider is disabled".to_string()));
        }
        Self::new(pool.strategy, pool.accounts)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Enabled accounts in insertion order.
    pub fn enabled(&self) -> impl Iterator<Item = &A> {
        self.enabled.iter().filter_map(|&i| self.accounts.get(i))
    }

    /// Looks up an account by name, including disabled ones.
    pub fn find(&self, name: &str) -> Option<&A> {
        self.accounts.iter().find(|a| a.name() == name)
    }

    /// # Summary
    /// Chooses the account for one send.
    ///
    /// # Logic
    /// 1. A name pinned in `ctx` wins over the strategy; it must exist and be enabled.
    /// 2. Otherwise the configured strategy picks among enabled accounts.
    ///
    /// # Returns
    /// * `NotifyError::Config` for an unknown or disabled pinned name.
    pub fn select(&self, ctx: &SendContext) -> Result<&A, NotifyError> {
        if let Some(name) = ctx.account() {
            return match self.find(name) {
                Some(account) if account.is_enabled() => Ok(account),
                Some(_) => Err(NotifyError::Config(format!("account {} is disabled", name))),
                None => Err(NotifyError::Config(format!("account {} not found", name))),
            };
        }

        let slot = match self.strategy {
            Strategy::RoundRobin => {
                self.counter.fetch_add(1, Ordering::Relaxed) % self.enabled.len()
            }
            Strategy::Random => rand::thread_rng().gen_range(0..self.enabled.len()),
            Strategy::Weighted => {
                self.pick_weighted(rand::thread_rng().gen_range(0..self.total_weight))
            }
        };

        let account = self
            .enabled
            .get(slot)
            .and_then(|&i| self.accounts.get(i))
            .ok_or_else(|| NotifyError::Config("no available account".to_string()))?;
        debug!(strategy = %self.strategy, account = account.name(), "account selected");
        Ok(account)
    }

    /// First slot whose cumulative weight exceeds `roll`.
    fn pick_weighted(&self, roll: u64) -> usize {
        let mut cumulative = 0;
        for (slot, weight) in self.weights.iter().enumerate() {
            cumulative += weight;
            if roll < cumulative {
                return slot;
            }
        }
        self.weights.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::notify::entity::Account;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn pool(names: &[&str]) -> Vec<Account> {
        names.iter().map(|n| Account::new(*n, format!("key-{}", n))).collect()
    }

    #[test]
    fn test_round_robin_order() {
        let selector = Selector::new(Strategy::RoundRobin, pool(&["A", "B", "C"])).unwrap();
        let ctx = SendContext::new();
        let picks: Vec<&str> = (0..7)
            .map(|_| selector.select(&ctx).unwrap().name.as_str())
            .collect();
        assert_eq!(picks, vec!["A", "B", "C", "A", "B", "C", "A"]);
    }

    #[test]
    fn test_disabled_accounts_are_skipped() {
        let mut accounts = pool(&["A", "B", "C"]);
        accounts[1] = accounts[1].clone().disabled();
        let selector = Selector::new(Strategy::RoundRobin, accounts).unwrap();
        let ctx = SendContext::new();
        let picks: Vec<String> = (0..4)
            .map(|_| selector.select(&ctx).unwrap().name.clone())
            .collect();
        assert_eq!(picks, vec!["A", "C", "A", "C"]);
    }

    #[test]
    fn test_empty_or_disabled_pool_rejected() {
        assert!(matches!(
            Selector::<Account>::new(Strategy::Random, vec![]),
            Err(NotifyError::Config(_))
        ));
        let all_off = vec![Account::new("A", "k").disabled()];
        assert!(Selector::new(Strategy::RoundRobin, all_off).is_err());

        let mut cfg = PoolConfig::new(Strategy::RoundRobin, pool(&["A"]));
        cfg.disabled = true;
        assert!(Selector::from_pool(cfg).is_err());
    }

    #[test]
    fn test_pin_wins_over_strategy() {
        let mut accounts = pool(&["A", "B", "C"]);
        accounts.push(Account::new("D", "k").disabled());
        let selector = Selector::new(Strategy::RoundRobin, accounts).unwrap();

        let pinned = SendContext::new().with_account("C");
        for _ in 0..3 {
            assert_eq!(selector.select(&pinned).unwrap().name, "C");
        }

        let unknown = selector.select(&SendContext::new().with_account("Z"));
        assert!(matches!(unknown, Err(NotifyError::Config(_))));
        let disabled = selector.select(&SendContext::new().with_account("D"));
        assert!(matches!(disabled, Err(NotifyError::Config(_))));

        // pinning does not advance the round-robin counter
        assert_eq!(selector.select(&SendContext::new()).unwrap().name, "A");
    }

    #[test]
    fn test_pick_weighted_cumulative_boundaries() {
        let accounts = vec![
            Account::new("A", "k").with_weight(1),
            Account::new("B", "k").with_weight(3),
            Account::new("C", "k").with_weight(0),
        ];
        let selector = Selector::new(Strategy::Weighted, accounts).unwrap();
        assert_eq!(selector.total_weight, 5);
        assert_eq!(selector.pick_weighted(0), 0);
        assert_eq!(selector.pick_weighted(1), 1);
        assert_eq!(selector.pick_weighted(3), 1);
        assert_eq!(selector.pick_weighted(4), 2);
    }

    #[test]
    fn test_weighted_distribution() {
        let accounts = vec![
            Account::new("A", "k").with_weight(1),
            Account::new("B", "k").with_weight(2),
            Account::new("C", "k").with_weight(7),
        ];
        let selector = Selector::new(Strategy::Weighted, accounts).unwrap();
        let ctx = SendContext::new();
        let trials = 20_000;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..trials {
            *counts
                .entry(selector.select(&ctx).unwrap().name.clone())
                .or_default() += 1;
        }
        for (name, weight) in [("A", 0.1), ("B", 0.2), ("C", 0.7)] {
            let share = f64::from(counts[name]) / f64::from(trials);
            assert!(
                (share - weight).abs() < 0.03,
                "{} share {} too far from {}",
                name,
                share,
                weight
            );
        }
    }

    #[test]
    fn test_random_stays_in_enabled_set() {
        let mut accounts = pool(&["A", "B"]);
        accounts.push(Account::new("X", "k").disabled());
        let selector = Selector::new(Strategy::Random, accounts).unwrap();
        let ctx = SendContext::new();
        for _ in 0..200 {
            assert_ne!(selector.select(&ctx).unwrap().name, "X");
        }
    }

    #[test]
    fn test_concurrent_round_robin_is_balanced() {
        let selector = Arc::new(Selector::new(Strategy::RoundRobin, pool(&["A", "B"])).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let selector = selector.clone();
                std::thread::spawn(move || {
                    let ctx = SendContext::new();
                    (0..100)
                        .map(|_| selector.select(&ctx).unwrap().name.clone())
                        .filter(|n| n == "A")
                        .count()
                })
            })
            .collect();
        let a_total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(a_total, 400);
    }
}
