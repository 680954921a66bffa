use crate::proxy::Proxy;

/// Validated proxies in a fixed order, read through a wrapping cursor.
/// Membership never changes once built; only the cursor moves.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    proxies: Vec<Proxy>,
    index: usize,
}

impl ProxyPool {
    /// `None` when there is nothing to rotate through.
    pub fn new(proxies: Vec<Proxy>) -> Option<Self> {
        if proxies.is_empty() {
            return None;
        }
        Some(Self { proxies, index: 0 })
    }

    pub fn current(&self) -> &Proxy {
        &self.proxies[self.index]
    }

    /// Moves the cursor one step, wrapping past the end, and returns the new
    /// current proxy.
    pub fn rotate(&mut self) -> &Proxy {
        self.index = (self.index + 1) % self.proxies.len();
        self.current()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    // An empty pool can't be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Rotations allowed before the cycle is reset: twice the pool size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    used: usize,
    limit: usize,
}

impl RetryBudget {
    pub fn for_pool(pool: &ProxyPool) -> Self {
        Self {
            used: 0,
            limit: pool.len() * 2,
        }
    }

    /// Counts one rotation. Saturates at the limit; callers reset once
    /// `is_exhausted` reports true.
    pub fn record_rotation(&mut self) {
        if self.used < self.limit {
            self.used += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
