//! Gateway to the external price source.
//!
//! Quotes may be denominated in another listed asset instead of USD. Such
//! chains are resolved with a bounded loop: each hop asks for the RAW price of
//! the denominating asset, and the amounts are composed from the USD end back
//! to the requested asset.

use {
    crate::{asset::AssetRegistry, error::Error},
    number::fixed_point,
    primitive_types::{H160, U256},
    std::{collections::HashMap, sync::Arc},
};

/// Maximum number of quotes composed for one price, including the first.
pub const MAX_PRICE_HOPS: usize = 4;

/// Which side of the source's spread to quote.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PriceKind {
    /// Price plus spread.
    Buy,
    /// Price minus spread.
    Sell,
    /// Mid price.
    Raw,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Denomination {
    Usd,
    Asset(H160),
}

/// An 18-decimal price for one whole token, expressed in `denomination`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    pub amount: U256,
    pub denomination: Denomination,
}

/// External price source keyed by asset symbol.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait PriceSource: Send + Sync {
    /// Returns `None` when the source does not know the symbol.
    fn quote(&self, symbol: &str, kind: PriceKind) -> Option<Quote>;
}

/// Resolves listed assets to USD prices.
#[derive(Clone)]
pub struct PriceFeed {
    source: Arc<dyn PriceSource>,
}

impl PriceFeed {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// USD price of one whole `asset` token.
    pub fn quote(
        &self,
        registry: &dyn AssetRegistry,
        asset: H160,
        kind: PriceKind,
    ) -> Result<U256, Error> {
        let symbol = &registry.get(asset)?.symbol;
        self.resolve(registry, asset, symbol, kind)
    }

    /// Like [`PriceFeed::quote`] but for a symbol that may not be listed yet.
    pub(crate) fn resolve(
        &self,
        registry: &dyn AssetRegistry,
        asset: H160,
        symbol: &str,
        kind: PriceKind,
    ) -> Result<U256, Error> {
        let mut amounts = Vec::with_capacity(MAX_PRICE_HOPS);
        let mut visited = vec![asset];
        let (mut current, mut symbol, mut hop_kind) = (asset, symbol, kind);

        loop {
            if amounts.len() == MAX_PRICE_HOPS {
                return Err(Error::CyclicPriceReference(current));
            }
            let quote = self
                .source
                .quote(symbol, hop_kind)
                .ok_or(Error::NoPriceSource(current))?;
            amounts.push(quote.amount);

            let next = match quote.denomination {
                Denomination::Usd => break,
                Denomination::Asset(next) => next,
            };
            if visited.contains(&next) {
                return Err(Error::CyclicPriceReference(next));
            }
            visited.push(next);
            symbol = registry
                .asset(next)
                .ok_or(Error::NoPriceSource(next))?
                .symbol
                .as_str();
            current = next;
            hop_kind = PriceKind::Raw;
        }

        let mut amounts = amounts.into_iter().rev();
        let usd = amounts.next().unwrap_or_default();
        let price = amounts.try_fold(usd, |denominator_price, amount| {
            fixed_point::mul_down(amount, denominator_price)
        })?;
        if price.is_zero() {
            return Err(Error::NoPriceSource(asset));
        }

        if visited.len() > 1 {
            tracing::trace!(?asset, %kind, hops = visited.len(), %price, "resolved price chain");
        }
        Ok(price)
    }
}

/// In-memory price source with a symmetric spread per symbol.
#[derive(Clone, Debug, Default)]
pub struct StaticPriceSource {
    prices: HashMap<String, StaticPrice>,
}

#[derive(Clone, Copy, Debug)]
struct StaticPrice {
    raw: U256,
    denomination: Denomination,
    spread_bps: u16,
}

impl StaticPriceSource {
    /// Sets the RAW price of `symbol`. BUY and SELL quotes are `spread_bps`
    /// basis points above and below it; spreads above 100% are clamped.
    pub fn insert(
        &mut self,
        symbol: &str,
        raw: U256,
        denomination: Denomination,
        spread_bps: u16,
    ) {
        self.prices.insert(
            symbol.to_string(),
            StaticPrice {
                raw,
                denomination,
                spread_bps: spread_bps.min(BPS),
            },
        );
    }
}

const BPS: u16 = 10_000;

impl PriceSource for StaticPriceSource {
    fn quote(&self, symbol: &str, kind: PriceKind) -> Option<Quote> {
        let price = self.prices.get(symbol)?;
        let factor = match kind {
            PriceKind::Buy => BPS + price.spread_bps,
            PriceKind::Sell => BPS - price.spread_bps,
            PriceKind::Raw => BPS,
        };
        let amount =
            fixed_point::mul_div_down(price.raw, U256::from(factor), U256::from(BPS)).ok()?;
        Some(Quote {
            amount,
            denomination: price.denomination,
        })
    }
}
