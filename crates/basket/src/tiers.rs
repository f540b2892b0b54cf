//! Tiered pricing of ordinary assets.
//!
//! Every ordinary asset has a target USD allocation derived from its
//! category weight and its weight within the category. A band of 2% around
//! the target splits the asset's possible values into three zones:
//! underweight, neutral and overweight. Trades that move the asset towards
//! its target are priced at the favourable side of the quote, trades that
//! push it away additionally pay the balance fee.
//!
//! A single trade can cross zones, so pricing produces an ordered list of
//! tiers walking from the asset's current value in the direction the trade
//! moves it. There are three zones, hence at most [`MAX_TIERS`] tiers.

use {
    crate::{
        asset::AssetRegistry,
        error::Error,
        price_feed::{PriceFeed, PriceKind},
    },
    number::fixed_point,
    primitive_types::{H160, U256},
};

/// One tier per allocation zone.
pub const MAX_TIERS: usize = 3;

/// Denominator of the margin band: the band is `target / 50` wide on either
/// side of the target.
const MARGIN_DIVISOR: u64 = 50;

/// Balance fees are expressed in tenths of a percent.
const FEE_DENOMINATOR: u64 = 1_000;

/// Direction an asset moves relative to the pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// The asset is paid into the pool. Tier prices are the USD credited per
    /// whole token.
    In,
    /// The asset is paid out of the pool. Tier prices are the USD charged per
    /// whole token.
    Out,
}

/// The part of a trade that is already fixed when a side is priced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Known {
    /// Token amount in native units.
    Amount(U256),
    /// USD value, 18-decimal fixed point.
    Value(U256),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capacity {
    /// Maximum amount of tokens, in native units, traded at the tier price.
    Bounded(U256),
    Unbounded,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tier {
    /// USD per whole token, 18-decimal fixed point.
    pub price: U256,
    pub capacity: Capacity,
}

/// Ordered pricing tiers for one side of a trade.
///
/// Always holds between one and [`MAX_TIERS`] tiers with non-zero prices.
/// All tiers but the last are bounded by a non-zero capacity, the last tier
/// is unbounded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tiers {
    unit: U256,
    tiers: Vec<Tier>,
}

impl Tiers {
    pub fn try_new(unit: U256, tiers: Vec<Tier>) -> Result<Self, Error> {
        let Some((last, init)) = tiers.split_last() else {
            return Err(Error::InvalidTiers);
        };
        let bounded = init.iter().all(|tier| match tier.capacity {
            Capacity::Bounded(capacity) => !capacity.is_zero(),
            Capacity::Unbounded => false,
        });
        if unit.is_zero()
            || tiers.len() > MAX_TIERS
            || last.capacity != Capacity::Unbounded
            || !bounded
            || tiers.iter().any(|tier| tier.price.is_zero())
        {
            return Err(Error::InvalidTiers);
        }
        Ok(Self { unit, tiers })
    }

    /// A single unbounded tier.
    pub fn single(unit: U256, price: U256) -> Result<Self, Error> {
        Self::try_new(
            unit,
            vec![Tier {
                price,
                capacity: Capacity::Unbounded,
            }],
        )
    }

    /// Native units per whole token of the priced asset.
    pub fn unit(&self) -> U256 {
        self.unit
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Zone {
    Underweight,
    Neutral,
    Overweight,
}

/// Target USD allocation of an asset together with its margin band.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Allocation {
    pub target: U256,
    pub low: U256,
    pub high: U256,
}

impl Allocation {
    /// `target = total * category_weight / category_weight_sum * weight /
    /// weight_total`. The target is zero when either denominator is.
    pub fn new(
        total_value: U256,
        category_weight: u8,
        category_weight_sum: u16,
        weight: u8,
        weight_total: u16,
    ) -> Result<Self, Error> {
        if category_weight_sum == 0 || weight_total == 0 {
            return Ok(Self::default());
        }
        let category = fixed_point::mul_div_down(
            total_value,
            category_weight.into(),
            category_weight_sum.into(),
        )?;
        let target = fixed_point::mul_div_down(category, weight.into(), weight_total.into())?;
        let margin = target / MARGIN_DIVISOR;
        Ok(Self {
            target,
            low: target - margin,
            high: target.checked_add(margin).ok_or(Error::Overflow)?,
        })
    }

    pub fn zone(&self, value: U256) -> Zone {
        if value < self.low {
            Zone::Underweight
        } else if value > self.high {
            Zone::Overweight
        } else {
            Zone::Neutral
        }
    }
}

/// Quotes of an asset from its price source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quotes {
    pub buy: U256,
    pub sell: U256,
    pub raw: U256,
}

impl Quotes {
    pub fn fetch(
        feed: &PriceFeed,
        registry: &dyn AssetRegistry,
        asset: H160,
    ) -> Result<Self, Error> {
        Ok(Self {
            buy: feed.quote(registry, asset, PriceKind::Buy)?,
            sell: feed.quote(registry, asset, PriceKind::Sell)?,
            raw: feed.quote(registry, asset, PriceKind::Raw)?,
        })
    }

    /// Tier price of each zone for the given side, ordered underweight,
    /// neutral, overweight.
    fn prices(&self, side: Side, balance_fee: u8) -> Result<[U256; 3], Error> {
        let fee = u64::from(balance_fee);
        Ok(match side {
            Side::In => {
                let penalty = fixed_point::mul_div_down(
                    self.sell,
                    (FEE_DENOMINATOR - fee).into(),
                    FEE_DENOMINATOR.into(),
                )?;
                [self.buy, self.sell, penalty]
            }
            Side::Out => {
                let premium = fixed_point::mul_div_up(
                    self.buy,
                    (FEE_DENOMINATOR + fee).into(),
                    FEE_DENOMINATOR.into(),
                )?;
                [premium, self.buy, self.sell]
            }
        })
    }
}

/// Builds the tiers for an asset currently worth `value` USD.
pub fn build(
    allocation: &Allocation,
    value: U256,
    quotes: &Quotes,
    unit: U256,
    balance_fee: u8,
    side: Side,
) -> Result<Tiers, Error> {
    let [underweight, neutral, overweight] = quotes.prices(side, balance_fee)?;
    let capacity = |span: U256| fixed_point::mul_div_down(span, unit, quotes.raw);

    let mut tiers = Vec::with_capacity(MAX_TIERS);
    let mut push = |price: U256, span: U256| -> Result<(), Error> {
        let capacity = capacity(span)?;
        if !capacity.is_zero() {
            tiers.push(Tier {
                price,
                capacity: Capacity::Bounded(capacity),
            });
        }
        Ok(())
    };

    let last = match side {
        Side::In => {
            if value < allocation.low {
                push(underweight, allocation.low - value)?;
            }
            if value < allocation.high {
                push(neutral, allocation.high - value.max(allocation.low))?;
            }
            overweight
        }
        Side::Out => {
            if value > allocation.high {
                push(overweight, value - allocation.high)?;
            }
            if value > allocation.low {
                push(neutral, value.min(allocation.high) - allocation.low)?;
            }
            underweight
        }
    };
    tiers.push(Tier {
        price: last,
        capacity: Capacity::Unbounded,
    });

    Tiers::try_new(unit, tiers)
}

/// Prices one side of a trade in an ordinary asset worth `value` USD out of
/// a basket of ordinary assets worth `total_value` USD.
pub fn tier_prices(
    feed: &PriceFeed,
    registry: &dyn AssetRegistry,
    asset: H160,
    total_value: U256,
    value: U256,
    balance_fee: u8,
    side: Side,
) -> Result<Tiers, Error> {
    let info = registry.get(asset)?;
    if !info.category.is_ordinary() {
        return Err(Error::InvalidCategory(asset));
    }
    let weights = registry.category_weights();
    let allocation = Allocation::new(
        total_value,
        weights.get(info.category),
        weights.sum(),
        info.weight,
        registry.category_totals().get(info.category),
    )?;
    let quotes = Quotes::fetch(feed, registry, asset)?;
    let unit = fixed_point::unit(info.decimals)?;

    let tiers = build(&allocation, value, &quotes, unit, balance_fee, side)?;
    tracing::debug!(
        ?asset,
        %side,
        zone = ?allocation.zone(value),
        %value,
        target = %allocation.target,
        tiers = tiers.len(),
        "priced ordinary asset"
    );
    Ok(tiers)
}
