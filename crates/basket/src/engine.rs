//! Settlement entry points.
//!
//! Every settlement is priced against one [`Snapshot`] and committed with
//! that snapshot's version, so pricing never mixes pre- and post-trade state
//! and a second settlement against an outdated snapshot is rejected.

use {
    crate::{
        asset::AssetRegistry,
        error::Error,
        fee::{self, Leg, SharePrice},
        pool::{Delta, PoolState, PoolStore, Snapshot},
        price_feed::{PriceFeed, PriceKind},
        reserve,
        tiers::{self, Known, Side, Tiers},
        trade::{self, Rounding},
        valuation::{self, Aggregate, Valuation},
    },
    itertools::izip,
    number::fixed_point::{self, ONE_18},
    primitive_types::{H160, U256},
    std::sync::Arc,
    tracing::instrument,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Parameters {
    /// Share of the spread owed to the protocol, 18-decimal fraction.
    pub protocol_fee_rate: U256,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SwapKind {
    /// The input amount is fixed, the output is computed.
    GivenIn,
    /// The output amount is fixed, the input is computed.
    GivenOut,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapRequest {
    pub asset_in: H160,
    pub asset_out: H160,
    /// Input amount for [`SwapKind::GivenIn`], output amount for
    /// [`SwapKind::GivenOut`].
    pub amount: U256,
    pub kind: SwapKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapOutcome {
    pub asset_in: H160,
    pub asset_out: H160,
    pub amount_in: U256,
    pub amount_out: U256,
    /// USD value transferred between the two sides.
    pub value: U256,
    /// Share tokens owed to the protocol.
    pub protocol_fee: U256,
}

impl SwapOutcome {
    pub fn delta(&self) -> Delta {
        Delta {
            credits: vec![(self.asset_in, self.amount_in)],
            debits: vec![(self.asset_out, self.amount_out)],
            accrued_fees: self.protocol_fee,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JoinOutcome {
    /// Amounts taken from the caller, aligned with the pool's assets.
    pub amounts_in: Vec<U256>,
    pub minted: U256,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExitOutcome {
    /// Amounts paid to the caller, aligned with the pool's assets.
    pub amounts_out: Vec<U256>,
    pub burned: U256,
}

/// Prices and settles trades against a pool.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<dyn AssetRegistry>,
    feed: PriceFeed,
    parameters: Parameters,
}

impl Engine {
    pub fn new(registry: Arc<dyn AssetRegistry>, feed: PriceFeed, parameters: Parameters) -> Self {
        Self {
            registry,
            feed,
            parameters,
        }
    }

    pub fn registry(&self) -> &dyn AssetRegistry {
        self.registry.as_ref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Values the basket and the two assets at the given indices.
    pub fn aggregate(
        &self,
        state: &PoolState,
        index_a: usize,
        index_b: usize,
    ) -> Result<Aggregate, Error> {
        valuation::aggregate(
            &self.feed,
            self.registry.as_ref(),
            state.holdings(),
            index_a,
            index_b,
        )
    }

    /// Current price of one whole share token.
    pub fn share_price(&self, state: &PoolState) -> Result<U256, Error> {
        let share = self.registry.share();
        let index = state.index_of(share)?;
        Ok(self.aggregate(state, index, index)?.a.price)
    }

    /// Current price of one whole reserve token.
    pub fn reserve_price(&self, state: &PoolState) -> Result<U256, Error> {
        let index = state.index_of(self.registry.reserve())?;
        Ok(self.aggregate(state, index, index)?.a.price)
    }

    pub fn quote_swap(&self, snapshot: &Snapshot, request: &SwapRequest) -> Result<SwapOutcome, Error> {
        let state = &snapshot.state;
        let balance_fee = state
            .balance_fee
            .tenths_of_percent()
            .ok_or(Error::PoolLocked)?;
        if request.asset_in == request.asset_out || request.amount.is_zero() {
            return Err(Error::InvalidTrade);
        }
        let index_in = state.index_of(request.asset_in)?;
        let index_out = state.index_of(request.asset_out)?;
        let aggregate = self.aggregate(state, index_in, index_out)?;

        let price = |asset: H160, valuation: &Valuation, balance: U256, side, known| {
            self.side_tiers(
                &aggregate,
                Priced {
                    asset,
                    valuation,
                    balance,
                },
                balance_fee,
                side,
                known,
            )
        };
        let input = |known| {
            price(
                request.asset_in,
                &aggregate.a,
                state.balances[index_in],
                Side::In,
                known,
            )
        };
        let output = |known| {
            price(
                request.asset_out,
                &aggregate.b,
                state.balances[index_out],
                Side::Out,
                known,
            )
        };

        let (amount_in, amount_out, value) = match request.kind {
            SwapKind::GivenIn => {
                let amount_in = request.amount;
                let in_tiers = input(Known::Amount(amount_in))?;
                let (amount_out, value) =
                    trade::convert(&in_tiers, |value| output(Known::Value(value)), amount_in)?;
                (amount_in, amount_out, value)
            }
            SwapKind::GivenOut => {
                let amount_out = request.amount;
                let out_tiers = output(Known::Amount(amount_out))?;
                let value = trade::value_of(&out_tiers, amount_out, Rounding::Up)?;
                let in_tiers = input(Known::Value(value))?;
                let amount_in = trade::amount_for(&in_tiers, value, Rounding::Up)?;
                (amount_in, amount_out, value)
            }
        };
        if amount_in.is_zero() || amount_out.is_zero() {
            return Err(Error::InvalidTrade);
        }
        let available = state.balances[index_out];
        if amount_out > available {
            return Err(Error::InsufficientBalance {
                asset: request.asset_out,
                requested: amount_out,
                available,
            });
        }

        let protocol_fee = self.protocol_fee(state, &aggregate, request, amount_in, amount_out)?;
        Ok(SwapOutcome {
            asset_in: request.asset_in,
            asset_out: request.asset_out,
            amount_in,
            amount_out,
            value,
            protocol_fee,
        })
    }

    #[instrument(skip_all, fields(version = snapshot.version, kind = %request.kind))]
    pub fn swap(
        &self,
        store: &PoolStore,
        snapshot: &Snapshot,
        request: &SwapRequest,
    ) -> Result<SwapOutcome, Error> {
        let outcome = self.quote_swap(snapshot, request)?;
        store.commit(snapshot.version, &outcome.delta())?;
        tracing::info!(
            asset_in = ?outcome.asset_in,
            asset_out = ?outcome.asset_out,
            amount_in = %outcome.amount_in,
            amount_out = %outcome.amount_out,
            protocol_fee = %outcome.protocol_fee,
            "settled swap"
        );
        Ok(outcome)
    }

    /// Proportional join. `amounts` is the most the caller is willing to pay
    /// of each asset; only the share of it matching the pool's composition is
    /// taken, except for the very first join which takes everything.
    pub fn quote_join(&self, snapshot: &Snapshot, amounts: &[U256]) -> Result<JoinOutcome, Error> {
        let state = &snapshot.state;
        if amounts.len() != state.assets.len() {
            return Err(Error::LengthMismatch {
                assets: state.assets.len(),
                balances: amounts.len(),
            });
        }
        let share = self.registry.share();
        let shares_offered = state
            .assets
            .iter()
            .zip(amounts)
            .any(|(&asset, amount)| asset == share && !amount.is_zero());
        if shares_offered {
            return Err(Error::InvalidTrade);
        }

        let circulating = state.circulating_supply(share)?;
        let outcome = if circulating.is_zero() {
            self.bootstrap(state, amounts)?
        } else {
            let ratios = izip!(&state.assets, &state.balances, amounts)
                .filter(|(asset, balance, _)| **asset != share && !balance.is_zero())
                .map(|(_, balance, amount)| fixed_point::mul_div_down(*amount, *ONE_18, *balance))
                .collect::<Result<Vec<_>, _>>()?;
            let ratio = ratios.into_iter().min().ok_or(Error::InvalidTrade)?;
            let minted = fixed_point::mul_div_down(circulating, ratio, *ONE_18)?;
            let amounts_in = state
                .assets
                .iter()
                .zip(&state.balances)
                .map(|(asset, balance)| {
                    if *asset == share {
                        return Ok(U256::zero());
                    }
                    fixed_point::mul_div_up(*balance, minted, circulating)
                })
                .collect::<Result<_, _>>()?;
            JoinOutcome { amounts_in, minted }
        };
        if outcome.minted.is_zero() {
            return Err(Error::InvalidTrade);
        }
        Ok(outcome)
    }

    /// First join into an empty pool: one share per USD of ordinary assets.
    fn bootstrap(&self, state: &PoolState, amounts: &[U256]) -> Result<JoinOutcome, Error> {
        let mut value = U256::zero();
        for (&asset, &amount) in state.assets.iter().zip(amounts) {
            if amount.is_zero() || self.registry.is_base(asset) {
                continue;
            }
            let price = self.feed.quote(self.registry.as_ref(), asset, PriceKind::Raw)?;
            let unit = fixed_point::unit(self.registry.get(asset)?.decimals)?;
            value = value
                .checked_add(fixed_point::mul_div_down(price, amount, unit)?)
                .ok_or(Error::Overflow)?;
        }
        let share_unit = self.unit(self.registry.share())?;
        Ok(JoinOutcome {
            amounts_in: amounts.to_vec(),
            minted: fixed_point::mul_div_down(value, share_unit, *ONE_18)?,
        })
    }

    #[instrument(skip_all, fields(version = snapshot.version))]
    pub fn join(
        &self,
        store: &PoolStore,
        snapshot: &Snapshot,
        amounts: &[U256],
    ) -> Result<JoinOutcome, Error> {
        let outcome = self.quote_join(snapshot, amounts)?;
        let delta = Delta {
            credits: credits(&snapshot.state.assets, &outcome.amounts_in),
            minted: outcome.minted,
            ..Default::default()
        };
        store.commit(snapshot.version, &delta)?;
        tracing::info!(minted = %outcome.minted, "settled join");
        Ok(outcome)
    }

    /// Pro-rata exit: burns `shares` and pays out the matching fraction of
    /// every asset except the share token.
    pub fn quote_exit(&self, snapshot: &Snapshot, shares: U256) -> Result<ExitOutcome, Error> {
        let state = &snapshot.state;
        let share = self.registry.share();
        if shares.is_zero() {
            return Err(Error::InvalidTrade);
        }
        let public = state
            .total_supply
            .checked_sub(state.balance_of(share))
            .ok_or(Error::SupplyUnderflow)?;
        if shares > public {
            return Err(Error::InsufficientBalance {
                asset: share,
                requested: shares,
                available: public,
            });
        }

        let circulating = state.circulating_supply(share)?;
        let amounts_out = state
            .assets
            .iter()
            .zip(&state.balances)
            .map(|(asset, balance)| {
                if *asset == share {
                    return Ok(U256::zero());
                }
                fixed_point::mul_div_down(*balance, shares, circulating)
            })
            .collect::<Result<_, _>>()?;
        Ok(ExitOutcome {
            amounts_out,
            burned: shares,
        })
    }

    #[instrument(skip_all, fields(version = snapshot.version))]
    pub fn exit(
        &self,
        store: &PoolStore,
        snapshot: &Snapshot,
        shares: U256,
    ) -> Result<ExitOutcome, Error> {
        let outcome = self.quote_exit(snapshot, shares)?;
        let delta = Delta {
            debits: credits(&snapshot.state.assets, &outcome.amounts_out),
            burned: outcome.burned,
            ..Default::default()
        };
        store.commit(snapshot.version, &delta)?;
        tracing::info!(burned = %outcome.burned, "settled exit");
        Ok(outcome)
    }

    /// Mints the accrued protocol fees. Returns the amount of share tokens
    /// minted; nothing is committed when no fees are due.
    #[instrument(skip_all, fields(version = snapshot.version))]
    pub fn collect_protocol_fees(&self, store: &PoolStore, snapshot: &Snapshot) -> Result<U256, Error> {
        let due = snapshot.state.due_protocol_fees;
        if due.is_zero() {
            return Ok(U256::zero());
        }
        let delta = Delta {
            minted: due,
            issued_fees: due,
            ..Default::default()
        };
        store.commit(snapshot.version, &delta)?;
        tracing::info!(%due, "collected protocol fees");
        Ok(due)
    }

    fn side_tiers(
        &self,
        aggregate: &Aggregate,
        priced: Priced<'_>,
        balance_fee: u8,
        side: Side,
        known: Known,
    ) -> Result<Tiers, Error> {
        let Priced {
            asset,
            valuation,
            balance,
        } = priced;
        if asset == self.registry.reserve() {
            let unit = self.unit(asset)?;
            return reserve::reserve_tiers(asset, aggregate.total_value, balance, unit, side, known);
        }
        if asset == self.registry.share() {
            return Tiers::single(self.unit(asset)?, valuation.price);
        }
        tiers::tier_prices(
            &self.feed,
            self.registry.as_ref(),
            asset,
            aggregate.total_value,
            valuation.value,
            balance_fee,
            side,
        )
    }

    fn protocol_fee(
        &self,
        state: &PoolState,
        aggregate: &Aggregate,
        request: &SwapRequest,
        amount_in: U256,
        amount_out: U256,
    ) -> Result<U256, Error> {
        if self.registry.is_base(request.asset_in) || self.registry.is_base(request.asset_out) {
            return Ok(U256::zero());
        }
        let share_unit = self.unit(self.registry.share())?;
        let share = SharePrice {
            price: reserve::share_price(
                aggregate.total_value,
                state.circulating_supply(self.registry.share())?,
                share_unit,
            )?,
            unit: share_unit,
        };
        fee::protocol_fee(
            request.kind,
            &Leg {
                price: aggregate.a.price,
                unit: self.unit(request.asset_in)?,
                amount: amount_in,
            },
            &Leg {
                price: aggregate.b.price,
                unit: self.unit(request.asset_out)?,
                amount: amount_out,
            },
            self.parameters.protocol_fee_rate,
            &share,
        )
    }

    fn unit(&self, asset: H160) -> Result<U256, Error> {
        Ok(fixed_point::unit(self.registry.get(asset)?.decimals)?)
    }
}

/// The side of a swap being priced.
struct Priced<'a> {
    asset: H160,
    valuation: &'a Valuation,
    balance: U256,
}

fn credits(assets: &[H160], amounts: &[U256]) -> Vec<(H160, U256)> {
    assets
        .iter()
        .copied()
        .zip(amounts.iter().copied())
        .filter(|(_, amount)| !amount.is_zero())
        .collect()
}
