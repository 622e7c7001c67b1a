//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::backtest::{BacktestResult, CapitalConfig};
use crate::domain::error::DivtraderError;

/// Port for persisting the artifacts of one backtest run.
pub trait ReportPort {
    /// Writes the run and returns the folder it was written to.
    fn write(
        &self,
        result: &BacktestResult,
        capital: &CapitalConfig,
        run_timestamp: &str,
    ) -> Result<PathBuf, DivtraderError>;
}
