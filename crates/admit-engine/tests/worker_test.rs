//! Worker task lifecycle and message handling.

use std::sync::Arc;
use std::time::Duration;

use admit_core::{
    CancelRequest, ContractData, Direction, Exchange, ManualClock, OrderRequest, Price, Request,
    RiskEvent, Volume,
};
use admit_engine::{spawn_risk_engine, spawn_timer, EngineError, PaperHost, RiskEngine};
use admit_rules::{ParamMap, ParamValue};
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};

fn setup() -> (RiskEngine, Arc<PaperHost>) {
    let host = Arc::new(PaperHost::new());
    host.add_contract(ContractData {
        symbol: "IF2401".to_string(),
        exchange: Exchange::new("CFFEX"),
        name: String::new(),
        pricetick: Price::new(dec!(0.2)),
        size: dec!(300),
        min_volume: None,
        max_volume: None,
    })
    .unwrap();
    let clock = Arc::new(ManualClock::new(1_705_276_800_000));
    (RiskEngine::new(host.clone(), clock), host)
}

fn order(volume: rust_decimal::Decimal) -> OrderRequest {
    OrderRequest::limit(
        "IF2401",
        Exchange::new("CFFEX"),
        Direction::Short,
        Price::new(dec!(4000)),
        Volume::new(volume),
    )
}

#[tokio::test]
async fn test_send_and_cancel_through_handle() {
    let (engine, host) = setup();
    let (handle, join) = spawn_risk_engine(engine, 16);

    let id = handle.send_order(order(dec!(1))).await.unwrap();
    assert!(id.is_some());
    assert!(handle.send_order(order(dec!(500))).await.unwrap().is_none());

    let cancel = CancelRequest::new(id.unwrap(), "IF2401", Exchange::new("CFFEX"));
    assert!(handle.cancel_order(cancel).await.unwrap());

    assert_eq!(host.sent_orders().len(), 1);
    assert_eq!(host.sent_cancels().len(), 1);

    handle.shutdown().await;
    join.await.unwrap();
}

#[tokio::test]
async fn test_evaluate_does_not_forward() {
    let (engine, host) = setup();
    let (handle, _join) = spawn_risk_engine(engine, 16);

    let verdict = handle
        .evaluate(Request::Order(order(dec!(101))))
        .await
        .unwrap();
    let rejection = verdict.unwrap_err();
    assert_eq!(rejection.rule, "order_size");

    assert!(handle
        .evaluate(Request::Order(order(dec!(1))))
        .await
        .unwrap()
        .is_ok());
    assert!(host.sent_orders().is_empty());
}

#[tokio::test]
async fn test_parameter_update_and_snapshot() {
    let (engine, _host) = setup();
    let (handle, _join) = spawn_risk_engine(engine, 16);

    let mut params = ParamMap::new();
    params.insert("order_size_limit".to_string(), ParamValue::Int(2));
    handle.update_parameters("order_size", params).await.unwrap();
    assert!(handle.send_order(order(dec!(3))).await.unwrap().is_none());

    let mut bad = ParamMap::new();
    bad.insert("order_size_limit".to_string(), ParamValue::Str("x".into()));
    assert!(matches!(
        handle.update_parameters("order_size", bad).await,
        Err(EngineError::Rule(_))
    ));
    assert!(matches!(
        handle.update_parameters("missing", ParamMap::new()).await,
        Err(EngineError::UnknownRule(_))
    ));

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(
        snap.rule("order_size").unwrap().parameters["order_size_limit"],
        ParamValue::Int(2)
    );
}

#[tokio::test]
async fn test_events_applied_in_order() {
    let (engine, _host) = setup();
    let (handle, _join) = spawn_risk_engine(engine, 16);

    let mut params = ParamMap::new();
    params.insert("order_flow_limit".to_string(), ParamValue::Int(1));
    params.insert("order_flow_clear".to_string(), ParamValue::Int(2));
    handle.update_parameters("order_flow", params).await.unwrap();

    assert!(handle.send_order(order(dec!(1))).await.unwrap().is_some());
    assert!(handle.send_order(order(dec!(2))).await.unwrap().is_none());

    handle.event(RiskEvent::Timer).await.unwrap();
    handle.try_event(RiskEvent::Timer).unwrap();

    // Both timer events are processed before this request
    assert!(handle.send_order(order(dec!(3))).await.unwrap().is_some());
}

#[tokio::test]
async fn test_timer_task_drives_rules() {
    let (engine, _host) = setup();
    let (handle, _join) = spawn_risk_engine(engine, 16);

    let mut params = ParamMap::new();
    params.insert("order_flow_clear".to_string(), ParamValue::Int(1_000));
    handle.update_parameters("order_flow", params).await.unwrap();

    let timer = spawn_timer(handle.clone(), Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snap = handle.snapshot().await.unwrap();
    let ticks = snap.rule("order_flow").unwrap().variables["order_flow_timer"]
        .as_i64()
        .unwrap();
    assert!(ticks >= 1, "expected timer ticks, got {}", ticks);

    timer.abort();
}

#[tokio::test]
async fn test_handle_errors_after_shutdown() {
    let (engine, _host) = setup();
    let (handle, join) = spawn_risk_engine(engine, 16);

    handle.shutdown().await;
    join.await.unwrap();

    assert!(handle.is_closed());
    assert!(matches!(
        handle.send_order(order(dec!(1))).await,
        Err(EngineError::WorkerClosed)
    ));
    assert_err!(handle.flush().await);
    assert_err!(handle.try_event(RiskEvent::Timer));
    assert!(matches!(
        handle.event(RiskEvent::Timer).await,
        Err(EngineError::WorkerClosed)
    ));
}

#[tokio::test]
async fn test_flush_and_settings() {
    let (engine, _host) = setup();
    let (handle, _join) = spawn_risk_engine(engine, 16);

    let mut params = ParamMap::new();
    params.insert("order_flow_clear".to_string(), ParamValue::Int(1_000));
    params.insert("active".to_string(), ParamValue::Bool(false));
    handle.update_parameters("order_flow", params).await.unwrap();

    for _ in 0..3 {
        assert_ok!(handle.event(RiskEvent::Timer).await);
    }
    assert_ok!(handle.flush().await);

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(
        snap.rule("order_flow").unwrap().variables["order_flow_timer"],
        ParamValue::Int(3)
    );

    let settings = handle.settings().await.unwrap();
    let saved = settings.get("order_flow").unwrap();
    assert_eq!(saved["active"], ParamValue::Bool(false));
    assert_eq!(saved["order_flow_clear"], ParamValue::Int(1_000));
    assert_eq!(settings.len(), 9);
}
