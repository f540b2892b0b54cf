use {
    super::init_tracing,
    crate::{
        engine::{Engine, SwapKind, SwapRequest},
        error::Error,
        pool::{BalanceFee, PoolState},
        tests::{Basket, tokens, usd},
    },
    number::fixed_point::ONE_18,
    primitive_types::{H160, U256},
};

fn swap(asset_in: H160, asset_out: H160, amount: U256, kind: SwapKind) -> SwapRequest {
    SwapRequest {
        asset_in,
        asset_out,
        amount,
        kind,
    }
}

/// `T * B`, scaled down by one reserve unit.
fn constant_product(engine: &Engine, basket: &Basket, state: &PoolState) -> U256 {
    let index = state.index_of(basket.reserve).unwrap();
    let total = engine.aggregate(state, index, index).unwrap().total_value;
    total * state.balances[index] / *ONE_18
}

#[test]
fn reserve_deposit_is_priced_against_the_grown_balance() {
    init_tracing();
    let basket = Basket::balanced();
    let engine = basket.engine();
    let snapshot = basket.store.snapshot();

    let request = swap(basket.reserve, basket.usdc, tokens(250, 18), SwapKind::GivenIn);
    let outcome = engine.swap(&basket.store, &snapshot, &request).unwrap();

    // T / (B + dB) = $4M / 1,250 per reserve token.
    assert_eq!(outcome.value, usd(250 * 3_200));
    assert_eq!(outcome.amount_out, tokens(800_000, 6));

    let state = basket.state();
    let price = engine.reserve_price(&state).unwrap();
    assert_eq!(price, usd(2_560));
    assert_eq!(
        price * state.balance_of(basket.reserve) / *ONE_18,
        usd(3_200_000)
    );
    assert_eq!(
        constant_product(&engine, &basket, &state),
        constant_product(&engine, &basket, &snapshot.state)
    );
}

#[test]
fn reserve_purchase_solves_the_invariant_in_reverse() {
    let basket = Basket::balanced();
    let engine = basket.engine();
    let snapshot = basket.store.snapshot();

    let request = swap(
        basket.usdc,
        basket.reserve,
        tokens(1_000_000, 6),
        SwapKind::GivenIn,
    );
    let outcome = engine.swap(&basket.store, &snapshot, &request).unwrap();

    assert_eq!(outcome.value, usd(1_000_000));
    assert_eq!(outcome.amount_out, tokens(200, 18));
    let state = basket.state();
    assert_eq!(engine.reserve_price(&state).unwrap(), usd(6_250));
    assert_eq!(
        constant_product(&engine, &basket, &state),
        constant_product(&engine, &basket, &snapshot.state)
    );
}

#[test]
fn reserve_trades_keep_the_constant_product() {
    init_tracing();
    let basket = Basket::balanced();
    let engine = basket.engine();
    let initial = constant_product(&engine, &basket, &basket.state());

    let trades = [
        swap(basket.reserve, basket.weth, tokens(100, 18), SwapKind::GivenIn),
        swap(basket.wbtc, basket.reserve, tokens(50, 18), SwapKind::GivenOut),
        swap(basket.reserve, basket.usdc, tokens(10, 18), SwapKind::GivenIn),
        swap(basket.usdc, basket.reserve, tokens(25_000, 6), SwapKind::GivenIn),
    ];
    for request in trades {
        let snapshot = basket.store.snapshot();
        engine.swap(&basket.store, &snapshot, &request).unwrap();

        let state = basket.state();
        let index = state.index_of(basket.reserve).unwrap();
        let aggregate = engine.aggregate(&state, index, index).unwrap();
        // Price times balance is the ordinary value, up to rounding of the
        // price.
        let implied = aggregate.a.price * state.balances[index] / *ONE_18;
        assert!(aggregate.total_value - implied <= state.balances[index] / *ONE_18 + U256::one());

        // T * B holds up to rounding, within a billionth.
        let product = constant_product(&engine, &basket, &state);
        assert!(product >= initial - initial / U256::exp10(9));
        assert!(product - initial.min(product) <= initial / U256::exp10(9));
    }
}

#[test]
fn reserve_trades_are_fee_exempt() {
    let basket = Basket::new(50, BalanceFee::new(0), *ONE_18);
    let engine = basket.engine();
    let snapshot = basket.store.snapshot();

    let request = swap(basket.reserve, basket.usdc, tokens(10, 18), SwapKind::GivenIn);
    let outcome = engine.quote_swap(&snapshot, &request).unwrap();
    assert!(outcome.amount_out < tokens(40_000, 6));
    assert_eq!(outcome.protocol_fee, U256::zero());
}

#[test]
fn reserve_cannot_be_drained() {
    let basket = Basket::balanced();
    let engine = basket.engine();

    let request = swap(
        basket.usdc,
        basket.reserve,
        tokens(1_000, 18),
        SwapKind::GivenOut,
    );
    assert_eq!(
        engine.quote_swap(&basket.store.snapshot(), &request),
        Err(Error::InsufficientBalance {
            asset: basket.reserve,
            requested: tokens(1_000, 18),
            available: tokens(1_000, 18),
        })
    );
}

#[test]
fn deposit_into_an_empty_reserve_is_rejected() {
    let basket = Basket::balanced();
    basket.set_balance(basket.reserve, U256::zero());
    let engine = basket.engine();

    let request = swap(basket.reserve, basket.weth, U256::one(), SwapKind::GivenIn);
    assert_eq!(
        engine.swap(&basket.store, &basket.store.snapshot(), &request),
        Err(Error::InsufficientBalance {
            asset: basket.reserve,
            requested: U256::zero(),
            available: U256::zero(),
        })
    );
    assert_eq!(basket.state().balance_of(basket.weth), tokens(500, 18));
}
