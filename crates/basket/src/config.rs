//! TOML configuration of a basket.
//!
//! ```toml
//! reserve = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
//! share = "0xffffffffffffffffffffffffffffffffffffffff"
//! balance-fee = 5
//! protocol-fee-rate = "500000000000000000"
//! total-supply = "4000000000000000000000000"
//!
//! [category-weights]
//! product = 1
//! common = 1
//! usd = 2
//!
//! [[assets]]
//! address = "0x0101010101010101010101010101010101010101"
//! symbol = "WETH"
//! decimals = 18
//! category = "common"
//! weight = 1
//! balance = "500000000000000000000"
//!
//! [[prices]]
//! symbol = "WETH"
//! price = "2000000000000000000000"
//! spread-bps = 50
//! ```

use {
    crate::{
        asset::{Asset, Category, CategoryWeights, Registry},
        engine::Parameters,
        pool::{BalanceFee, PoolState},
        price_feed::{Denomination, PriceFeed, StaticPriceSource},
    },
    anyhow::{Context, Result, ensure},
    number::{fixed_point::ONE_18, serialization::HexOrDecimalU256},
    primitive_types::{H160, U256},
    serde::Deserialize,
    serde_with::serde_as,
    std::{path::Path, str::FromStr},
};

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub reserve: H160,
    pub share: H160,

    /// Balance fee in tenths of a percent, clamped to [`BalanceFee::MAX`].
    #[serde(default)]
    pub balance_fee: u8,

    /// Disables swaps.
    #[serde(default)]
    pub locked: bool,

    /// Share of the spread owed to the protocol as an 18-decimal fraction,
    /// clamped to 100%.
    #[serde_as(as = "HexOrDecimalU256")]
    #[serde(default)]
    pub protocol_fee_rate: U256,

    #[serde_as(as = "HexOrDecimalU256")]
    #[serde(default)]
    pub total_supply: U256,

    pub category_weights: CategoryWeights,

    /// Listed assets in listing order. An asset whose price is denominated
    /// in another asset must come after that asset.
    #[serde(default)]
    pub assets: Vec<AssetConfig>,

    /// Prices for the built-in static price source.
    #[serde(default)]
    pub prices: Vec<PriceConfig>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AssetConfig {
    pub address: H160,
    pub symbol: String,
    pub decimals: u8,
    pub category: Category,
    #[serde(default)]
    pub weight: u8,
    /// Initial pool balance in native units.
    #[serde_as(as = "HexOrDecimalU256")]
    #[serde(default)]
    pub balance: U256,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PriceConfig {
    pub symbol: String,
    /// RAW price of one whole token, 18-decimal fixed point.
    #[serde_as(as = "HexOrDecimalU256")]
    pub price: U256,
    /// Asset the price is denominated in, USD when absent.
    #[serde(default)]
    pub denominated_in: Option<H160>,
    #[serde(default)]
    pub spread_bps: u16,
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse basket config")
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = contents
            .parse::<Self>()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), assets = config.assets.len(), "loaded config");
        Ok(config)
    }

    /// Static price source holding the configured `[[prices]]`.
    pub fn price_source(&self) -> StaticPriceSource {
        let mut source = StaticPriceSource::default();
        for price in &self.prices {
            let denomination = price
                .denominated_in
                .map_or(Denomination::Usd, Denomination::Asset);
            source.insert(&price.symbol, price.price, denomination, price.spread_bps);
        }
        source
    }

    /// Lists every configured asset in file order.
    pub fn registry(&self, feed: &PriceFeed) -> Result<Registry> {
        let mut registry = Registry::new(self.reserve, self.share, self.category_weights);
        for asset in &self.assets {
            registry
                .list(
                    asset.address,
                    Asset {
                        symbol: asset.symbol.clone(),
                        decimals: asset.decimals,
                        category: asset.category,
                        weight: asset.weight,
                    },
                    feed,
                )
                .with_context(|| format!("failed to list {} ({:?})", asset.symbol, asset.address))?;
        }
        for (name, address) in [("reserve", self.reserve), ("share", self.share)] {
            ensure!(
                self.assets.iter().any(|asset| asset.address == address),
                "{name} asset {address:?} is not configured"
            );
        }
        Ok(registry)
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            protocol_fee_rate: self.protocol_fee_rate.min(*ONE_18),
        }
    }

    pub fn balance_fee(&self) -> BalanceFee {
        if self.locked {
            BalanceFee::LOCKED
        } else {
            BalanceFee::new(self.balance_fee)
        }
    }

    pub fn initial_state(&self) -> PoolState {
        PoolState {
            assets: self.assets.iter().map(|asset| asset.address).collect(),
            balances: self.assets.iter().map(|asset| asset.balance).collect(),
            total_supply: self.total_supply,
            due_protocol_fees: U256::zero(),
            balance_fee: self.balance_fee(),
        }
    }
}
