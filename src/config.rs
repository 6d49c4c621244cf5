use crate::v_info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub trading: TradingConfig,
    pub mining: MiningConfig,
    pub fuel: FuelConfig,
    pub market: MarketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fixed tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Seconds before an outstanding step is force-cleared
    pub watchdog_seconds: u64,
    /// Net error counter value above which the scheduler halts
    pub error_threshold: u32,
    /// Run periodic maintenance every N ticks
    pub maintenance_interval_ticks: u64,
    /// Seconds to pause all remote calls after a rate-limit response
    pub rate_limit_pause_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Minimum credits of profit per unit for a route to be worth running
    pub min_profit_per_unit: i32,
    /// Hauler count in the Trade manager above which pairs are extracted
    pub max_trade_haulers: usize,
    /// Credits to keep in reserve when buying trade goods
    pub credit_reserve: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Free cargo units below which consolidation/jettison kicks in
    pub cargo_full_buffer: i32,
    /// Keep at least this many fresh surveys available per mining site
    pub surveys_per_site: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelConfig {
    /// Fuel units held back when judging whether a leg is reachable
    pub reserve_units: i32,
    /// Fallback price per FUEL good when no market data is cached
    pub default_fuel_price: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Minutes after which cached price data counts as stale
    pub price_stale_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig {
                tick_interval_ms: 350,
                watchdog_seconds: 10,
                error_threshold: 10,
                maintenance_interval_ticks: 25,
                rate_limit_pause_seconds: 10,
            },
            trading: TradingConfig {
                min_profit_per_unit: 2,
                max_trade_haulers: 3,
                credit_reserve: 5000,
            },
            mining: MiningConfig {
                cargo_full_buffer: 10,
                surveys_per_site: 3,
            },
            fuel: FuelConfig {
                reserve_units: 5,
                default_fuel_price: 72,
            },
            market: MarketConfig {
                price_stale_minutes: 15,
            },
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(config_path).exists() {
            v_info!("📋 Loading configuration from {}", config_path);
            let config_str = fs::read_to_string(config_path)?;
            let config: EngineConfig = toml::from_str(&config_str)?;
            config.validate()?;
            Ok(config)
        } else {
            v_info!("📋 Creating default configuration at {}", config_path);
            let config = EngineConfig::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }
        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".to_string());
        }
        if self.scheduler.error_threshold == 0 {
            return Err("error_threshold must be greater than 0".to_string());
        }
        if self.mining.cargo_full_buffer < 0 {
            return Err("cargo_full_buffer must not be negative".to_string());
        }
        if self.fuel.reserve_units < 0 {
            return Err("reserve_units must not be negative".to_string());
        }
        if self.trading.credit_reserve < 0 {
            return Err("credit_reserve must not be negative".to_string());
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        v_info!("📋 Engine configuration:");
        v_info!("   ⏰ Tick interval: {}ms", self.scheduler.tick_interval_ms);
        v_info!("   🐕 Watchdog: {}s", self.scheduler.watchdog_seconds);
        v_info!("   🧮 Error threshold: {}", self.scheduler.error_threshold);
        v_info!("   🚚 Max trade haulers: {}", self.trading.max_trade_haulers);
        v_info!("   📦 Cargo-full buffer: {} units", self.mining.cargo_full_buffer);
    }
}
