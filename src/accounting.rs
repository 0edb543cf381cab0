//! Run-scoped token accounting and the budget gate.
//!
//! One `Accounting` instance lives for one filter run. The cumulative total
//! only ever grows, and once the budget is crossed the gate latches into
//! `Suppressing` for the remainder of the stream. Because the gate reads
//! cumulative state, drop decisions are order-dependent by design.

use crate::types::CostUsd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Running,
    Suppressing,
}

/// Per-record outcome of the budget gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Drop,
}

#[derive(Debug)]
pub struct Accounting {
    total: u64,
    prompt_overhead: u64,
    /// Cumulative budget; values <= 0 mean unlimited.
    max_tokens: i64,
    gate: Gate,
}

impl Accounting {
    pub fn new(prompt_overhead: usize, max_tokens: i64) -> Self {
        Self {
            total: 0,
            prompt_overhead: prompt_overhead as u64,
            max_tokens,
            gate: Gate::Running,
        }
    }

    /// Account one matched location hit. The prompt overhead is charged per
    /// hit, not per record, so a record matching two locations pays it twice.
    pub fn add_hit(&mut self, tokens: usize) {
        self.total += tokens as u64 + self.prompt_overhead;
    }

    /// Decide pass/drop after all of a record's hits have been accounted.
    /// The threshold log fires on the Running -> Suppressing edge only, so it
    /// appears exactly once per run no matter how many records follow.
    pub fn settle(&mut self) -> Verdict {
        if self.gate == Gate::Suppressing {
            return Verdict::Drop;
        }
        if self.max_tokens > 0 && self.total > self.max_tokens as u64 {
            self.gate = Gate::Suppressing;
            tracing::info!(
                total = self.total,
                max_tokens = self.max_tokens,
                "token budget exceeded, suppressing remaining records"
            );
            return Verdict::Drop;
        }
        Verdict::Pass
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn prompt_overhead(&self) -> u64 {
        self.prompt_overhead
    }

    pub fn budget_exceeded(&self) -> bool {
        self.gate == Gate::Suppressing
    }

    pub fn price(&self, price_per_1k_tokens: f64) -> CostUsd {
        CostUsd(self.total as f64 / 1000.0 * price_per_1k_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_never_drops() {
        let mut acc = Accounting::new(0, -1);
        for _ in 0..100 {
            acc.add_hit(1_000_000);
            assert_eq!(acc.settle(), Verdict::Pass);
        }
        assert!(!acc.budget_exceeded());
    }

    #[test]
    fn zero_max_tokens_means_unlimited() {
        let mut acc = Accounting::new(0, 0);
        acc.add_hit(50);
        assert_eq!(acc.settle(), Verdict::Pass);
    }

    #[test]
    fn gate_latches_at_the_crossing_record() {
        // max 10, three records of 4 tokens each: pass at 4, pass at 8,
        // drop at 12 and everything after.
        let mut acc = Accounting::new(0, 10);
        acc.add_hit(4);
        assert_eq!(acc.settle(), Verdict::Pass);
        acc.add_hit(4);
        assert_eq!(acc.settle(), Verdict::Pass);
        acc.add_hit(4);
        assert_eq!(acc.settle(), Verdict::Drop);
        assert!(acc.budget_exceeded());

        acc.add_hit(0);
        assert_eq!(acc.settle(), Verdict::Drop);
        assert!(acc.budget_exceeded());
    }

    #[test]
    fn total_exactly_at_budget_still_passes() {
        let mut acc = Accounting::new(0, 8);
        acc.add_hit(8);
        assert_eq!(acc.settle(), Verdict::Pass);
    }

    #[test]
    fn overhead_is_charged_per_hit() {
        let mut acc = Accounting::new(3, -1);
        acc.add_hit(5);
        acc.add_hit(5);
        assert_eq!(acc.total(), 16);
    }

    #[test]
    fn total_is_monotone() {
        let mut acc = Accounting::new(2, 5);
        let mut last = 0;
        for i in 0..20 {
            acc.add_hit(i % 3);
            let _ = acc.settle();
            assert!(acc.total() >= last);
            last = acc.total();
        }
    }

    #[test]
    fn price_is_per_thousand_tokens() {
        let mut acc = Accounting::new(0, -1);
        acc.add_hit(2500);
        assert_eq!(acc.price(0.002), CostUsd(0.005));
    }
}
