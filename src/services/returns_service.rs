use std::collections::HashMap;

use crate::errors::ReportError;
use crate::models::{MarketDataset, PeriodReturn};

/// Latest-period percent return per ticker: change between the last two
/// aligned closes. Pure and deterministic; the fetcher already guarantees at
/// least two rows, the check here is the contract's backstop.
pub fn compute_returns(
    dataset: &MarketDataset,
) -> Result<HashMap<String, PeriodReturn>, ReportError> {
    let mut out = HashMap::with_capacity(dataset.symbols().len());

    for symbol in dataset.symbols() {
        let (prev, last) = dataset.last_two(symbol).ok_or_else(|| {
            ReportError::InsufficientHistory { ticker: symbol.clone(), rows: dataset.rows() }
        })?;
        out.insert(symbol.clone(), PeriodReturn::between(prev.close, last.close));
    }

    Ok(out)
}
