//! Simulation scenario emitter: publishes canned `TxEvent`s to `events.tx.SIM`
//! so an operator can exercise the streaming path end to end without a real
//! upstream chain-watcher. Mirrors the worked examples in the testable
//! properties: six $10k deposits breach the daily volume limit, six $5k
//! deposits breach the structuring count.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::bus::Bus;
use crate::domain::event::{Asset, Chain, Direction, EventId, SCHEMA_VERSION};
use crate::domain::subject::{AccountId, Address, CountryCode, KycTier, Subject, UserId};
use crate::domain::TxEvent;

pub const CLEAN: &str = "clean";
pub const OFAC: &str = "ofac";
pub const DAILY: &str = "daily";
pub const STRUCTURING: &str = "structuring";

pub fn valid_scenarios() -> &'static [&'static str] {
    &[CLEAN, OFAC, DAILY, STRUCTURING]
}

/// Run a named scenario, publishing its transaction events to the bus.
pub async fn run(bus: &Bus, scenario: &str) -> anyhow::Result<()> {
    match scenario {
        CLEAN => sim_clean(bus).await,
        OFAC => sim_ofac(bus).await,
        DAILY => sim_daily(bus).await,
        STRUCTURING => sim_structuring(bus).await,
        other => anyhow::bail!(
            "invalid scenario {other}, expected one of {:?}",
            valid_scenarios()
        ),
    }
}

async fn sim_clean(bus: &Bus) -> anyhow::Result<()> {
    info!("sim clean");
    pub_tx(bus, "U1", "A1", &["0xClean"], Decimal::new(100, 2)).await
}

async fn sim_ofac(bus: &Bus) -> anyhow::Result<()> {
    info!("sim ofac");
    pub_tx(
        bus,
        "U2",
        "A2",
        &["0x000000000000000000000000000000000000dEaD"],
        Decimal::new(100, 2),
    )
    .await
}

/// 6 * $10,000 = $60,000, over the $50,000 daily volume limit.
async fn sim_daily(bus: &Bus) -> anyhow::Result<()> {
    info!("sim daily limit breach");
    for i in 0..6 {
        pub_tx(
            bus,
            "U3",
            "A3",
            &[format!("0xU3{i:02}")],
            Decimal::new(10000, 0),
        )
        .await?;
    }
    Ok(())
}

/// 6 * $5,000 deposits, each below the $10,000 "small" threshold, push the
/// structuring count from 5 to 6 -- over the count threshold.
async fn sim_structuring(bus: &Bus) -> anyhow::Result<()> {
    info!("sim structuring");
    for i in 0..6 {
        pub_tx(
            bus,
            "U4",
            "A4",
            &[format!("0xU4{i:02}")],
            Decimal::new(5000, 0),
        )
        .await?;
    }
    Ok(())
}

async fn pub_tx(
    bus: &Bus,
    user: &str,
    account: &str,
    addrs: &[impl AsRef<str>],
    usd: Decimal,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let event = TxEvent {
        schema_version: SCHEMA_VERSION.to_string(),
        event_id: EventId::new(),
        occurred_at: now,
        observed_at: now,
        subject: Subject {
            user_id: UserId::new(user),
            account_id: AccountId::new(account),
            addresses: addrs.iter().map(|a| Address::new(a.as_ref())).collect::<smallvec::SmallVec<[Address; 4]>>(),
            geo_iso: CountryCode::new("US"),
            kyc_tier: KycTier::L2,
        },
        chain: Chain::new("SIM"),
        tx_hash: crate::domain::event::random_hex_id(),
        direction: Direction::Inbound,
        asset: Asset::new("USDC"),
        amount: (usd * Decimal::new(1_000_000, 0)).to_string(),
        usd_value: usd,
        confirmations: 3,
        max_finality_depth: 12,
    };

    bus.publish_durable(&format!("{}.SIM", crate::bus::SUBJ_TX_EVENT), &event)
        .await
}
