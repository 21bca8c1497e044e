use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use riskr::domain::event::{Asset, Chain, Direction, EventId, TxEvent, SCHEMA_VERSION};
use riskr::domain::subject::{AccountId, Address, CountryCode, KycTier, Subject, UserId};
use riskr::domain::Decision;
use riskr::rules::{DailyVolumeRule, JurisdictionRule, KycCapRule, OfacRule, Rule, StructuringRule};
use riskr::state::RollingView;

fn create_test_event(user_id: &str, usd_value: Decimal) -> TxEvent {
    let now = chrono::Utc::now();
    TxEvent {
        schema_version: SCHEMA_VERSION.to_string(),
        event_id: EventId::new(),
        occurred_at: now,
        observed_at: now,
        subject: Subject {
            user_id: UserId::new(user_id),
            account_id: AccountId::new("A123"),
            addresses: smallvec::smallvec![Address::new("0x1234567890abcdef")],
            geo_iso: CountryCode::new("US"),
            kyc_tier: KycTier::L2,
        },
        chain: Chain::inline(),
        tx_hash: "0xabc123".to_string(),
        direction: Direction::Outbound,
        asset: Asset::new("USDC"),
        amount: "1000000".to_string(),
        usd_value,
        confirmations: 6,
        max_finality_depth: 12,
    }
}

fn bench_ofac_rule(c: &mut Criterion) {
    let mut sanctions = HashSet::new();
    for i in 0..1000 {
        sanctions.insert(format!("0x{:040x}", i));
    }

    let rule = OfacRule::new("R1_OFAC".to_string(), Decision::RejectFatal, sanctions);

    let event = create_test_event("user1", Decimal::new(1000, 0));

    c.bench_function("ofac_rule_eval_inline_miss", |b| {
        b.iter(|| rule.eval_inline(black_box(&event)))
    });
}

fn bench_jurisdiction_rule(c: &mut Criterion) {
    let blocked = HashSet::from([
        "IR".to_string(),
        "KP".to_string(),
        "CU".to_string(),
        "SY".to_string(),
        "RU".to_string(),
    ]);

    let rule = JurisdictionRule::new(
        "R2_JURISDICTION".to_string(),
        Decision::RejectFatal,
        blocked,
    );

    let event = create_test_event("user1", Decimal::new(1000, 0));

    c.bench_function("jurisdiction_rule_eval_inline_allowed", |b| {
        b.iter(|| rule.eval_inline(black_box(&event)))
    });
}

fn bench_kyc_cap_rule(c: &mut Criterion) {
    let caps = HashMap::from([
        ("L0".to_string(), Decimal::new(100, 0)),
        ("L1".to_string(), Decimal::new(1000, 0)),
        ("L2".to_string(), Decimal::new(10000, 0)),
    ]);

    let rule = KycCapRule::new("R3_KYC".to_string(), Decision::HoldAuto, caps);

    let event = create_test_event("user1", Decimal::new(5000, 0));

    c.bench_function("kyc_cap_rule_eval_inline_within_cap", |b| {
        b.iter(|| rule.eval_inline(black_box(&event)))
    });
}

fn bench_daily_volume_rule(c: &mut Criterion) {
    let rule = DailyVolumeRule::new(
        "R4_DAILY".to_string(),
        Decision::HoldAuto,
        Decimal::new(50000, 0),
    );

    let view = RollingView::new();
    view.add_tx("user1", chrono::Utc::now(), Decimal::new(1000, 0));
    let event = create_test_event("user1", Decimal::new(1000, 0));

    c.bench_function("daily_volume_rule_eval_streaming", |b| {
        b.iter(|| rule.eval_streaming(black_box(chrono::Utc::now()), black_box(&event), black_box(&view)))
    });
}

fn bench_structuring_rule(c: &mut Criterion) {
    let rule = StructuringRule::new(
        "R5_STRUCTURING".to_string(),
        Decision::Review,
        Decimal::new(3000, 0),
        5,
    );

    let view = RollingView::new();
    for _ in 0..3 {
        view.add_tx("user1", chrono::Utc::now(), Decimal::new(2500, 0));
    }
    let event = create_test_event("user1", Decimal::new(2500, 0));

    c.bench_function("structuring_rule_eval_streaming", |b| {
        b.iter(|| rule.eval_streaming(black_box(chrono::Utc::now()), black_box(&event), black_box(&view)))
    });
}

fn bench_rolling_view_add_and_sum(c: &mut Criterion) {
    let view = RollingView::new();

    // Pre-populate with some users
    for i in 0..1000 {
        view.add_tx(
            &format!("user{}", i),
            chrono::Utc::now(),
            Decimal::new(100, 0),
        );
    }

    c.bench_function("rolling_view_add_tx_existing_user", |b| {
        let mut i = 0u32;
        b.iter(|| {
            let user_id = format!("user{}", i % 1000);
            i = i.wrapping_add(1);
            view.add_tx(black_box(&user_id), chrono::Utc::now(), Decimal::new(50, 0))
        })
    });

    c.bench_function("rolling_view_rolling_usd_24h", |b| {
        b.iter(|| view.rolling_usd_24h(black_box("user1")))
    });
}

fn bench_full_inline_pipeline(c: &mut Criterion) {
    let mut sanctions = HashSet::new();
    sanctions.insert("0xdead".to_string());

    let blocked_countries = HashSet::from(["IR".to_string()]);

    let caps = HashMap::from([("L2".to_string(), Decimal::new(10000, 0))]);

    let rules: Vec<Arc<dyn Rule>> = vec![
        Arc::new(OfacRule::new(
            "R1_OFAC".to_string(),
            Decision::RejectFatal,
            sanctions,
        )),
        Arc::new(JurisdictionRule::new(
            "R2_JURISDICTION".to_string(),
            Decision::RejectFatal,
            blocked_countries,
        )),
        Arc::new(KycCapRule::new("R3_KYC".to_string(), Decision::HoldAuto, caps)),
    ];

    let event = create_test_event("user1", Decimal::new(1000, 0));

    c.bench_function("full_inline_pipeline", |b| {
        b.iter(|| {
            let mut decision = Decision::Allow;
            for rule in &rules {
                let result = rule.eval_inline(black_box(&event));
                if result.hit && result.decision > decision {
                    decision = result.decision;
                }
            }
            decision
        })
    });
}

criterion_group!(
    benches,
    bench_ofac_rule,
    bench_jurisdiction_rule,
    bench_kyc_cap_rule,
    bench_daily_volume_rule,
    bench_structuring_rule,
    bench_rolling_view_add_and_sum,
    bench_full_inline_pipeline,
);

criterion_main!(benches);
