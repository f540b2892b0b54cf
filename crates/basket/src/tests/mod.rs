//! Shared fixtures for unit and scenario tests.

use {
    crate::{
        asset::{Asset, Category, CategoryWeights, Registry},
        engine::{Engine, Parameters},
        pool::{BalanceFee, PoolState, PoolStore},
        price_feed::{Denomination, PriceFeed, StaticPriceSource},
    },
    primitive_types::{H160, U256},
    std::sync::Arc,
};


/// `amount` whole USD as an 18-decimal fixed point value.
pub fn usd(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// `amount` whole tokens in native units.
pub fn tokens(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::exp10(decimals.into())
}

/// A basket worth $4M sitting exactly on its target allocation:
///
/// | asset | category | price   | balance | value |
/// |-------|----------|---------|---------|-------|
/// | WETH  | common   | $2,000  | 500     | $1M   |
/// | WBTC  | product  | $50,000 | 20      | $1M   |
/// | USDC  | usd      | $1      | 2M      | $2M   |
///
/// with 1,000 reserve tokens and 4M shares in circulation.
pub struct Basket {
    pub reserve: H160,
    pub share: H160,
    pub weth: H160,
    pub wbtc: H160,
    pub usdc: H160,
    pub feed: PriceFeed,
    pub registry: Registry,
    pub store: PoolStore,
    pub parameters: Parameters,
}

impl Basket {
    pub const RESERVE: H160 = H160::repeat_byte(0xee);
    pub const SHARE: H160 = H160::repeat_byte(0xff);
    pub const WETH: H160 = H160::repeat_byte(0x01);
    pub const WBTC: H160 = H160::repeat_byte(0x02);
    pub const USDC: H160 = H160::repeat_byte(0x03);

    /// No spread, no balance fee, no protocol fee.
    pub fn balanced() -> Self {
        Self::new(0, BalanceFee::new(0), U256::zero())
    }

    pub fn new(spread_bps: u16, balance_fee: BalanceFee, protocol_fee_rate: U256) -> Self {
        let mut source = StaticPriceSource::default();
        for (symbol, price) in [("WETH", 2_000), ("WBTC", 50_000), ("USDC", 1)] {
            source.insert(symbol, usd(price), Denomination::Usd, spread_bps);
        }
        let feed = PriceFeed::new(Arc::new(source));

        let mut registry = Registry::new(
            Self::RESERVE,
            Self::SHARE,
            CategoryWeights {
                product: 1,
                common: 1,
                usd: 2,
            },
        );
        let listings = [
            (Self::RESERVE, "RSV", 18, Category::Base),
            (Self::SHARE, "SHR", 18, Category::Base),
            (Self::WETH, "WETH", 18, Category::Common),
            (Self::WBTC, "WBTC", 8, Category::Product),
            (Self::USDC, "USDC", 6, Category::Usd),
        ];
        for (address, symbol, decimals, category) in listings {
            let weight = if category == Category::Base { 0 } else { 1 };
            registry
                .list(
                    address,
                    Asset {
                        symbol: symbol.to_string(),
                        decimals,
                        category,
                        weight,
                    },
                    &feed,
                )
                .unwrap();
        }

        let store = PoolStore::new(PoolState {
            assets: listings.iter().map(|listing| listing.0).collect(),
            balances: vec![
                tokens(1_000, 18),
                U256::zero(),
                tokens(500, 18),
                tokens(20, 8),
                tokens(2_000_000, 6),
            ],
            total_supply: tokens(4_000_000, 18),
            due_protocol_fees: U256::zero(),
            balance_fee,
        });

        Self {
            reserve: Self::RESERVE,
            share: Self::SHARE,
            weth: Self::WETH,
            wbtc: Self::WBTC,
            usdc: Self::USDC,
            feed,
            registry,
            store,
            parameters: Parameters { protocol_fee_rate },
        }
    }

    pub fn state(&self) -> PoolState {
        self.store.snapshot().state
    }

    pub fn engine(&self) -> Engine {
        Engine::new(
            Arc::new(self.registry.clone()),
            self.feed.clone(),
            self.parameters,
        )
    }

    /// Overwrites the balance of `asset`.
    pub fn set_balance(&self, asset: H160, balance: U256) {
        self.store.modify(|state| {
            let index = state.index_of(asset).unwrap();
            state.balances[index] = balance;
        });
    }
}
