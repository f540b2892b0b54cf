use {
    super::init_tracing,
    crate::{
        engine::{SwapKind, SwapRequest},
        error::Error,
        pool::BalanceFee,
        tests::{Basket, tokens, usd},
    },
    maplit::hashmap,
    number::fixed_point::ONE_18,
    primitive_types::{H160, U256},
    std::collections::HashMap,
};

/// Orders `amounts` by the pool's asset list, zero for missing assets.
fn aligned(basket: &Basket, amounts: HashMap<H160, U256>) -> Vec<U256> {
    basket
        .state()
        .assets
        .iter()
        .map(|asset| amounts.get(asset).copied().unwrap_or_default())
        .collect()
}

#[test]
fn proportional_join_keeps_prices() {
    init_tracing();
    let basket = Basket::balanced();
    let engine = basket.engine();
    let snapshot = basket.store.snapshot();
    let share_price = engine.share_price(&snapshot.state).unwrap();
    let reserve_price = engine.reserve_price(&snapshot.state).unwrap();

    let offered = aligned(
        &basket,
        hashmap! {
            basket.reserve => tokens(100, 18),
            basket.weth => tokens(60, 18),
            basket.wbtc => tokens(2, 8),
            basket.usdc => tokens(200_000, 6),
        },
    );
    let outcome = engine.join(&basket.store, &snapshot, &offered).unwrap();

    assert_eq!(outcome.minted, tokens(400_000, 18));
    assert_eq!(
        outcome.amounts_in,
        aligned(
            &basket,
            hashmap! {
                basket.reserve => tokens(100, 18),
                // Only the 10% matching the other deposits is taken.
                basket.weth => tokens(50, 18),
                basket.wbtc => tokens(2, 8),
                basket.usdc => tokens(200_000, 6),
            },
        )
    );

    let state = basket.state();
    assert_eq!(state.total_supply, tokens(4_400_000, 18));
    assert_eq!(engine.share_price(&state).unwrap(), share_price);
    assert_eq!(engine.reserve_price(&state).unwrap(), reserve_price);
}

#[test]
fn exit_pays_out_pro_rata() {
    let basket = Basket::balanced();
    let engine = basket.engine();
    let snapshot = basket.store.snapshot();

    let outcome = engine
        .exit(&basket.store, &snapshot, tokens(400_000, 18))
        .unwrap();

    assert_eq!(outcome.burned, tokens(400_000, 18));
    assert_eq!(
        outcome.amounts_out,
        aligned(
            &basket,
            hashmap! {
                basket.reserve => tokens(100, 18),
                basket.weth => tokens(50, 18),
                basket.wbtc => tokens(2, 8),
                basket.usdc => tokens(200_000, 6),
            },
        )
    );
    let state = basket.state();
    assert_eq!(state.total_supply, tokens(3_600_000, 18));
    assert_eq!(engine.share_price(&state).unwrap(), usd(1));
}

#[test]
fn first_join_mints_one_share_per_dollar() {
    init_tracing();
    let basket = Basket::balanced();
    basket.store.modify(|state| {
        state.balances.iter_mut().for_each(|balance| *balance = U256::zero());
        state.total_supply = U256::zero();
    });
    let engine = basket.engine();
    assert_eq!(engine.share_price(&basket.state()).unwrap(), usd(1));

    let deposit = aligned(
        &basket,
        hashmap! {
            basket.reserve => tokens(10, 18),
            basket.weth => tokens(1, 18),
            basket.usdc => tokens(3_000, 6),
        },
    );
    let outcome = engine
        .join(&basket.store, &basket.store.snapshot(), &deposit)
        .unwrap();
    assert_eq!(outcome.minted, tokens(5_000, 18));
    assert_eq!(outcome.amounts_in, deposit);
    assert_eq!(engine.share_price(&basket.state()).unwrap(), usd(1));

    // Assets the pool does not hold yet do not constrain later joins.
    let second = aligned(
        &basket,
        hashmap! {
            basket.reserve => tokens(1, 18),
            basket.weth => tokens(1, 17),
            basket.wbtc => tokens(1, 8),
            basket.usdc => tokens(300, 6),
        },
    );
    let outcome = engine
        .join(&basket.store, &basket.store.snapshot(), &second)
        .unwrap();
    assert_eq!(outcome.minted, tokens(500, 18));
    assert_eq!(outcome.amounts_in[3], U256::zero());
}

#[test]
fn due_fees_dilute_until_collected() {
    init_tracing();
    let basket = Basket::new(50, BalanceFee::new(0), *ONE_18 / U256::from(2));
    let engine = basket.engine();

    let request = SwapRequest {
        asset_in: basket.weth,
        asset_out: basket.usdc,
        amount: tokens(1, 18),
        kind: SwapKind::GivenIn,
    };
    let outcome = engine
        .swap(&basket.store, &basket.store.snapshot(), &request)
        .unwrap();
    assert!(!outcome.protocol_fee.is_zero());

    let state = basket.state();
    let circulating = state.circulating_supply(basket.share).unwrap();
    assert_eq!(circulating, state.total_supply + outcome.protocol_fee);
    let diluted = engine.share_price(&state).unwrap();

    // Exiting every public share leaves the fee owners' claim in the pool.
    let exit = engine
        .quote_exit(&basket.store.snapshot(), state.total_supply)
        .unwrap();
    let usdc = state.index_of(basket.usdc).unwrap();
    assert!(exit.amounts_out[usdc] < state.balances[usdc]);

    let minted = engine
        .collect_protocol_fees(&basket.store, &basket.store.snapshot())
        .unwrap();
    assert_eq!(minted, outcome.protocol_fee);
    let state = basket.state();
    assert_eq!(state.circulating_supply(basket.share).unwrap(), circulating);
    assert_eq!(engine.share_price(&state).unwrap(), diluted);
}

#[test]
fn join_against_a_stale_snapshot_is_rejected() {
    let basket = Basket::balanced();
    let engine = basket.engine();
    let stale = basket.store.snapshot();
    let request = SwapRequest {
        asset_in: basket.weth,
        asset_out: basket.usdc,
        amount: tokens(1, 18),
        kind: SwapKind::GivenIn,
    };
    engine.swap(&basket.store, &stale, &request).unwrap();

    let offered = aligned(
        &basket,
        hashmap! {
            basket.reserve => tokens(10, 18),
            basket.weth => tokens(5, 18),
            basket.wbtc => tokens(1, 7),
            basket.usdc => tokens(20_000, 6),
        },
    );
    assert!(engine.quote_join(&stale, &offered).is_ok());
    assert!(matches!(
        engine.join(&basket.store, &stale, &offered),
        Err(Error::ReplayWindowViolation { .. })
    ));
}
