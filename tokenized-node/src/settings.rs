use serde::Deserialize;
use std::path::PathBuf;
use tokenized_db_exports::DbConfig;
use tokenized_holdings_exports::HoldingsConfig;
use tokenized_vote_exports::VoteConfig;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LoggingSettings {
    pub level: usize,
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        match self.level {
            0 => LevelFilter::ERROR,
            1 => LevelFilter::WARN,
            2 => LevelFilter::INFO,
            3 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub path: PathBuf,
    pub max_open_files: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct HoldingsSettings {
    pub channel_size: usize,
    pub max_holding_statuses: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct VoteSettings {
    pub max_ballots: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeSettings {
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub holdings: HoldingsSettings,
    pub votes: VoteSettings,
}

impl NodeSettings {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            path: self.storage.path.clone(),
            max_open_files: self.storage.max_open_files,
        }
    }

    pub fn holdings_config(&self) -> HoldingsConfig {
        HoldingsConfig {
            channel_size: self.holdings.channel_size,
            max_holding_statuses: self.holdings.max_holding_statuses,
        }
    }

    pub fn vote_config(&self) -> VoteConfig {
        VoteConfig {
            max_ballots: self.votes.max_ballots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tokenized_models::config::build_tokenized_settings;

    #[test]
    #[serial]
    fn test_base_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/base_config/config.toml");
        std::env::set_var("TOKENIZED_CONFIG_PATH", path);
        std::env::set_var("TOKENIZED_CONFIG_OVERRIDE_PATH", "/nonexistent/config.toml");
        std::env::set_var("TOKENIZED__HOLDINGS__CHANNEL_SIZE", "12");
        let settings: NodeSettings = build_tokenized_settings("tokenized-node-test", "TOKENIZED")
            .unwrap();
        std::env::remove_var("TOKENIZED_CONFIG_PATH");
        std::env::remove_var("TOKENIZED_CONFIG_OVERRIDE_PATH");
        std::env::remove_var("TOKENIZED__HOLDINGS__CHANNEL_SIZE");

        assert_eq!(settings.logging.level_filter(), LevelFilter::INFO);
        assert_eq!(settings.holdings_config().channel_size, 12);
        assert_eq!(settings.db_config().max_open_files, 820);
        assert_eq!(settings.vote_config().max_ballots, 1_000_000);
    }
}
