//! INI file configuration adapter.

use crate::domain::error::DivtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DivtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| DivtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[rsi]
period = 14

[strategy]
entry_predicates = rsi, divergence

[backtest]
data = data/nifty50_5minute_data.csv
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_int("rsi", "period", 0), 14);
        assert_eq!(
            adapter.get_string("strategy", "entry_predicates"),
            Some("rsi, divergence".to_string())
        );
        assert_eq!(
            adapter.get_string("backtest", "data"),
            Some("data/nifty50_5minute_data.csv".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[capital]\nper_trade = 5000\n").unwrap();
        assert_eq!(adapter.get_string("capital", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[macd]\n").unwrap();
        assert_eq!(adapter.get_int("macd", "fast", 12), 12);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[macd]\nslow = abc\n").unwrap();
        assert_eq!(adapter.get_int("macd", "slow", 26), 26);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nstop_loss_percent = 0.015\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "stop_loss_percent", 0.0), 0.015);
    }

    #[test]
    fn get_double_accepts_integer_literal() {
        let adapter = FileConfigAdapter::from_string("[capital]\ntotal_capital = 50000\n").unwrap();
        assert_eq!(adapter.get_double("capital", "total_capital", 0.0), 50000.0);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[capital]\ntotal_capital = lots\n").unwrap();
        assert_eq!(adapter.get_double("capital", "total_capital", 99.9), 99.9);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[RSI]\nPeriod = 21\n").unwrap();
        assert_eq!(adapter.get_int("rsi", "period", 14), 21);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput_dir = /tmp/runs\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("/tmp/runs".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(
            matches!(err, DivtraderError::ConfigParse { ref file, .. } if file.contains("config.ini"))
        );
    }
}
