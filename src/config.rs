//! Construction-time configuration shared by all heap variants

use crate::storage::SizePolicy;
use crate::traits::HeapError;

/// Default branching factor for k-ary heaps
pub const DEFAULT_BRANCHING_FACTOR: usize = 4;

/// Builder for heap construction parameters.
///
/// Provides a fluent API; the same configuration can construct any variant.
/// Fields that do not apply to a variant (the branching factor for a
/// Fibonacci heap) are ignored by it.
///
/// # Example
///
/// ```rust
/// use pq_engine::HeapConfig;
/// use pq_engine::storage::SizePolicy;
///
/// let config = HeapConfig::new(1024)
///     .branching_factor(8)
///     .push_on_missing(true)
///     .size_policy(SizePolicy::AtLeast);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    pub(crate) max_size: usize,
    pub(crate) branching_factor: usize,
    pub(crate) check_duplicates: bool,
    pub(crate) push_on_missing: bool,
    pub(crate) size_policy: SizePolicy,
}

impl HeapConfig {
    /// Creates a configuration for a heap holding at most `max_size` keys.
    ///
    /// Keys accepted by the heap are `1..=max_size`.
    pub fn new(max_size: usize) -> Self {
        HeapConfig {
            max_size,
            branching_factor: DEFAULT_BRANCHING_FACTOR,
            check_duplicates: true,
            push_on_missing: false,
            size_policy: SizePolicy::Exact,
        }
    }

    /// Sets the branching factor `k` of k-ary heaps.
    pub fn branching_factor(mut self, k: usize) -> Self {
        self.branching_factor = k;
        self
    }

    /// Makes `push` reject keys that are already present.
    ///
    /// With the check disabled the caller guarantees key uniqueness; pushing a
    /// present key is then a programming error caught only by debug assertions.
    pub fn check_duplicates(mut self, enabled: bool) -> Self {
        self.check_duplicates = enabled;
        self
    }

    /// Makes `decrease_key` push keys that are not present instead of failing.
    pub fn push_on_missing(mut self, enabled: bool) -> Self {
        self.push_on_missing = enabled;
        self
    }

    /// Sets how supplied buffers are validated against the required length.
    pub fn size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }

    /// Returns the configured capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the configured branching factor.
    pub fn k(&self) -> usize {
        self.branching_factor
    }

    /// Checks the parameters every heap variant needs.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.max_size < 1 {
            return Err(HeapError::InvalidCapacity);
        }
        if self.branching_factor < 2 {
            return Err(HeapError::InvalidBranchingFactor(self.branching_factor));
        }
        Ok(())
    }
}
