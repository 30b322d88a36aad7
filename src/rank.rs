//! Cross-symbol ranking of setups
//!
//! Setups from every [`ScanResult`] are flattened in input order and sorted by
//! reward distance `|target - entry|`, largest first. The sort is stable, so
//! equal rewards keep their symbol/time order.

use crate::{Bias, ScanResult, Setup};

/// A setup tagged with the symbol it came from
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedSetup {
    pub symbol: String,
    pub setup: Setup,
}

/// Per-symbol line of a report
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub bias: Bias,
    pub total_setups: usize,
}

/// Summary of one scan pass over many symbols
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Report {
    pub summaries: Vec<SymbolSummary>,
    pub top: Vec<RankedSetup>,
}

impl Report {
    pub fn new(results: &[ScanResult], top_n: usize) -> Self {
        let summaries = results
            .iter()
            .map(|r| SymbolSummary {
                symbol: r.symbol.clone(),
                bias: r.bias,
                total_setups: r.setups.len(),
            })
            .collect();

        Self {
            summaries,
            top: rank_setups(results, top_n),
        }
    }

    /// Total number of setups across all symbols
    pub fn total_setups(&self) -> usize {
        self.summaries.iter().map(|s| s.total_setups).sum()
    }
}

/// Top `top_n` setups across `results`, largest reward distance first.
pub fn rank_setups(results: &[ScanResult], top_n: usize) -> Vec<RankedSetup> {
    let mut ranked: Vec<RankedSetup> = results
        .iter()
        .flat_map(|r| {
            r.setups.iter().map(move |setup| RankedSetup {
                symbol: r.symbol.clone(),
                setup: *setup,
            })
        })
        .collect();

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| b.setup.reward().total_cmp(&a.setup.reward()));
    ranked.truncate(top_n);

    log::debug!("ranked {} setup(s) from {} symbol(s)", ranked.len(), results.len());
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    fn setup(entry: f64, reward: f64, index: usize) -> Setup {
        Setup {
            direction: Direction::Bullish,
            entry,
            stop: entry - 1.0,
            target: entry + reward,
            index,
            timestamp: Some(index as i64),
        }
    }

    fn result(symbol: &str, bias: Bias, setups: Vec<Setup>) -> ScanResult {
        ScanResult {
            symbol: symbol.to_string(),
            bias,
            setups,
        }
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let results = vec![result(
            "AAPL",
            Bias::Bullish,
            vec![setup(100.0, 5.0, 2), setup(100.0, 3.0, 3), setup(100.0, 3.0, 4), setup(100.0, 1.0, 5)],
        )];

        let ranked = rank_setups(&results, 3);
        let rewards: Vec<f64> = ranked.iter().map(|r| r.setup.reward()).collect();
        assert_eq!(rewards, vec![5.0, 3.0, 3.0]);
        assert_eq!(ranked[1].setup.index, 3);
        assert_eq!(ranked[2].setup.index, 4);
    }

    #[test]
    fn test_ties_keep_symbol_order() {
        let results = vec![
            result("MSFT", Bias::Bullish, vec![setup(300.0, 2.0, 7)]),
            result("AAPL", Bias::Bullish, vec![setup(150.0, 2.0, 3)]),
            result("NVDA", Bias::Bullish, vec![setup(400.0, 4.0, 9)]),
        ];

        let ranked = rank_setups(&results, 10);
        let symbols: Vec<&str> = ranked.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["NVDA", "MSFT", "AAPL"]);
    }

    #[test]
    fn test_bearish_reward_is_absolute() {
        let bearish = Setup {
            direction: Direction::Bearish,
            entry: 50.0,
            stop: 50.4,
            target: 44.0,
            index: 2,
            timestamp: None,
        };
        let results = vec![
            result("SPY", Bias::Bullish, vec![setup(100.0, 1.0, 2)]),
            result("QQQ", Bias::Bearish, vec![bearish]),
        ];
        let ranked = rank_setups(&results, 10);
        assert_eq!(ranked[0].symbol, "QQQ");
    }

    #[test]
    fn test_rank_empty_and_zero() {
        assert!(rank_setups(&[], 10).is_empty());
        let results = vec![result("AAPL", Bias::Bullish, vec![setup(100.0, 1.0, 2)])];
        assert!(rank_setups(&results, 0).is_empty());
    }

    #[test]
    fn test_report_keeps_unknown_bias_symbols() {
        let results = vec![
            result("AAPL", Bias::Bullish, vec![setup(100.0, 1.0, 2), setup(100.0, 2.0, 3)]),
            result("TSLA", Bias::Unknown, Vec::new()),
        ];
        let report = Report::new(&results, 1);
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.summaries[1].bias, Bias::Unknown);
        assert_eq!(report.total_setups(), 2);
        assert_eq!(report.top.len(), 1);
        assert_eq!(report.top[0].setup.index, 3);
    }

    #[test]
    fn test_report_json() {
        let results = vec![result("AAPL", Bias::Bullish, vec![setup(100.0, 1.0, 2)])];
        let report = Report::new(&results, 10);
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
