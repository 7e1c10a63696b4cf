/// Number of ways to choose `k` items among `n`.
///
/// Saturates at `u128::MAX`, which is only reachable for pools far larger than
/// anything that can be enumerated anyway.
pub fn n_choose_k(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut res: u128 = 1;
    for i in 0..k {
        // res * (n - i) is always divisible by (i + 1).
        res = match res.checked_mul((n - i) as u128) {
            Some(x) => x / (i + 1) as u128,
            None => return u128::MAX,
        };
    }
    res
}

/// The k-combinations of `0..n`, in lexicographic order.
///
/// Only the current combination is held in memory. Choosing 0 items produces a
/// single empty combination, choosing more than `n` produces none.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Combinations {
        Combinations {
            n,
            indices: (0..k).collect(),
            started: false,
            exhausted: k > n,
        }
    }

    /// Advances to the next combination and returns it.
    ///
    /// The slice is only valid until the next call, which avoids allocating in
    /// the scoring loop.
    pub fn next_combination(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }
        let k = self.indices.len();
        // Find the rightmost position that can still move to the right.
        let mut pos = k;
        loop {
            if pos == 0 {
                self.exhausted = true;
                return None;
            }
            pos -= 1;
            if self.indices[pos] < self.n - (k - pos) {
                break;
            }
        }
        self.indices[pos] += 1;
        for j in (pos + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(&self.indices)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.next_combination().map(|c| c.to_vec())
    }
}
