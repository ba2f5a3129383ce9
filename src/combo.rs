//! Lazy enumeration of fixed-size index subsets.
//!
//! Subsets are produced in lexicographic order over the ascending index tuple:
//! for `n = 5, k = 3` the sequence starts `{0,1,2}, {0,1,3}, {0,1,4}, {0,2,3}, ...`
//! and ends at `{2,3,4}`. Each step is "next combination" stepping on an index
//! array: find the rightmost index below its maximum, bump it, and reset every
//! index to its right to consecutive successors. Amortized work per step is O(1),
//! worst case O(k), with no allocation after construction.

use crate::error::{ChromaError, Result};

// ============================================================================
// SubsetEnumerator
// ============================================================================

/// Produces every `k`-element subset of `0..n` exactly once.
///
/// The enumerator is not an [`Iterator`]: the current subset is borrowed from an
/// internal buffer that is overwritten on each [`SubsetEnumerator::advance`].
///
/// ```
/// use chroma::combo::SubsetEnumerator;
///
/// let mut subsets = SubsetEnumerator::new(4, 2).unwrap();
/// let mut seen = Vec::new();
/// while subsets.advance() {
///     seen.push(subsets.current().to_vec());
/// }
/// assert_eq!(seen.len(), 6);
/// assert_eq!(seen[0], vec![0, 1]);
/// assert_eq!(seen[5], vec![2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct SubsetEnumerator {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl SubsetEnumerator {
    /// Creates an enumerator over the `k`-subsets of `0..n`.
    ///
    /// `k == 0` yields exactly one (empty) subset.
    ///
    /// # Errors
    /// Returns [`ChromaError::SubsetTooLarge`] if `k > n`.
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if k > n {
            return Err(ChromaError::SubsetTooLarge { n, k });
        }
        Ok(Self {
            n,
            indices: (0..k).collect(),
            started: false,
            exhausted: false,
        })
    }

    /// Restarts the enumerator over the `k`-subsets of `0..n`, reusing its buffer.
    ///
    /// # Errors
    /// Returns [`ChromaError::SubsetTooLarge`] if `k > n`; the enumerator is left
    /// unchanged.
    pub fn reset(&mut self, n: usize, k: usize) -> Result<()> {
        if k > n {
            return Err(ChromaError::SubsetTooLarge { n, k });
        }
        self.n = n;
        self.indices.clear();
        self.indices.extend(0..k);
        self.started = false;
        self.exhausted = false;
        Ok(())
    }

    /// Universe size.
    #[inline]
    pub fn universe(&self) -> usize {
        self.n
    }

    /// Subset size.
    #[inline]
    pub fn subset_size(&self) -> usize {
        self.indices.len()
    }

    /// Moves to the next subset. Returns `false` once every subset has been produced,
    /// and on every call after that.
    #[inline]
    pub fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if !self.started {
            self.started = true;
            return true;
        }

        let k = self.indices.len();
        let limit = self.n - k;
        // Rightmost position i whose index is below its ceiling `limit + i`.
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < limit + i {
                let mut next = self.indices[i] + 1;
                for slot in &mut self.indices[i..] {
                    *slot = next;
                    next += 1;
                }
                return true;
            }
        }

        self.exhausted = true;
        false
    }

    /// The subset produced by the last successful [`SubsetEnumerator::advance`],
    /// as ascending indices.
    #[inline(always)]
    pub fn current(&self) -> &[usize] {
        debug_assert!(self.started && !self.exhausted, "no current subset");
        &self.indices
    }

    /// Returns `true` once the sequence has ended.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Default for SubsetEnumerator {
    /// The single empty subset of an empty universe.
    fn default() -> Self {
        Self {
            n: 0,
            indices: Vec::new(),
            started: false,
            exhausted: false,
        }
    }
}

// ============================================================================
// Binomial coefficients
// ============================================================================

/// Returns `C(n, k)`, saturating at `u64::MAX`. Returns 0 when `k > n`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is divisible by (i + 1) at every step.
        acc = acc * u128::from(n - i) / u128::from(i + 1);
        if acc > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    acc as u64
}

// ============================================================================
// Tests
// ============================================================================
