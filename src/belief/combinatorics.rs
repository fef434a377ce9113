//! Counting helpers for the referent layer.
//!
//! `size()` on a belief state must agree exactly with enumeration, so the
//! closed forms here are the counting side of the
//! [`combinations`] iterator: `binomial_range(n, lo, hi)` equals the number
//! of combinations `combinations(items, r)` yields for `r` in `lo..=hi`
//! over `n` items.

/// Binomial coefficient `n` choose `k`, by the multiplicative method.
///
/// Out-of-range `k` counts zero subsets rather than failing.
pub fn choose(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut numerator: u128 = 1;
    let mut denominator: u128 = 1;
    let mut factor = u128::from(n);
    for step in 1..=u128::from(k) {
        numerator *= factor;
        denominator *= step;
        factor -= 1;
    }
    (numerator / denominator) as u64
}

/// Product of the integers in `start..=n`.
///
/// `factorial(n, 1)` is the ordinary factorial; higher starting points give
/// the partial products used to evaluate binomial coefficients without
/// computing the full `n!`. An empty range multiplies to one.
pub fn factorial(n: u64, start: u64) -> u128 {
    (start.max(1)..=n).map(u128::from).product()
}

/// Sum of `choose(n, k)` for `k` in `k_low..=k_high`, with `k_high` clamped
/// to `n`. An empty range sums to zero.
///
/// Evaluated incrementally: each term is derived from the previous via
/// `C(n, k+1) = C(n, k) * (n - k) / (k + 1)`.
pub fn binomial_range(n: u64, k_low: u64, k_high: u64) -> u64 {
    let k_high = k_high.min(n);
    if k_low > k_high {
        return 0;
    }
    let mut total: u128 = 0;
    let mut term = u128::from(choose(n, k_low));
    for k in k_low..=k_high {
        total += term;
        term = term * u128::from(n - k) / u128::from(k + 1);
    }
    total as u64
}

/// Iterator over the `r`-element combinations of `items`, in lexicographic
/// index order.
///
/// Yields nothing when `r` exceeds the item count, and exactly one empty
/// combination when `r` is zero.
#[derive(Debug, Clone)]
pub struct Combinations<T> {
    items: Vec<T>,
    indices: Vec<usize>,
    done: bool,
}

/// All `r`-element combinations of `items`.
pub fn combinations<T: Clone>(items: Vec<T>, r: usize) -> Combinations<T> {
    let done = r > items.len();
    Combinations {
        indices: (0..r).collect(),
        items,
        done,
    }
}

impl<T: Clone> Iterator for Combinations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result: Vec<T> = self
            .indices
            .iter()
            .map(|&i| self.items[i].clone())
            .collect();

        // advance the index vector to the next combination
        let n = self.items.len();
        let r = self.indices.len();
        let mut i = r;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] != i + n - r {
                self.indices[i] += 1;
                for j in i + 1..r {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }
        Some(result)
    }
}
