//! Batched set/get delivery policies and per-target outcomes.

mod common;

use common::TestAgent;
use snmpoll::{Client, Error, Value, mib};
use std::time::{Duration, Instant};

fn ospf_cost_target(a: u8, b: u8, c: u8, d: u8) -> snmpoll::Oid {
    mib::ospf_if_metric_instance(
        &mib::ospf_if_metric_value(),
        std::net::Ipv4Addr::new(a, b, c, d),
        0,
    )
}

async fn client_for(agent: &TestAgent, cumulative: bool) -> Client {
    Client::builder(agent.addr().to_string(), "public")
        .timeout(Duration::from_millis(200))
        .max_retries(1)
        .cumulative_sets(cumulative)
        .connect()
        .await
        .expect("connect")
}

#[tokio::test]
async fn cumulative_set_reports_per_target_outcomes() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, true).await;

    let targets = [
        (ospf_cost_target(10, 0, 0, 1), Value::Integer(10)),
        (ospf_cost_target(10, 0, 0, 2), Value::Integer(20)),
        (ospf_cost_target(10, 0, 0, 3), Value::Integer(30)),
    ];

    // The device accepts only the first target; the other two echo a
    // different value. Exactly those two come back false, not an
    // all-or-nothing failure.
    agent.rewrite_on_set(targets[1].0.clone(), Value::Integer(999));
    agent.rewrite_on_set(targets[2].0.clone(), Value::Integer(999));

    let outcomes = client.set_all(&targets).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[&targets[0].0]);
    assert!(!outcomes[&targets[1].0]);
    assert!(!outcomes[&targets[2].0]);
}

#[tokio::test]
async fn cumulative_set_all_accepted() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, true).await;

    let targets = [
        (ospf_cost_target(10, 0, 0, 1), Value::Integer(5)),
        (ospf_cost_target(10, 0, 0, 2), Value::Integer(6)),
    ];
    let outcomes = client.set_all(&targets).await.unwrap();
    assert!(outcomes.values().all(|&accepted| accepted));

    // The values really landed in the store.
    assert_eq!(agent.get(&targets[0].0), Some(Value::Integer(5)));
    assert_eq!(agent.get(&targets[1].0), Some(Value::Integer(6)));
}

#[tokio::test]
async fn throttled_set_isolates_a_failing_target() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, false).await;

    let targets = [
        (ospf_cost_target(10, 0, 0, 1), Value::Integer(10)),
        (ospf_cost_target(10, 0, 0, 2), Value::Integer(20)),
        (ospf_cost_target(10, 0, 0, 3), Value::Integer(30)),
    ];

    // Second target's value gets rewritten by the device.
    agent.rewrite_on_set(targets[1].0.clone(), Value::Integer(0));

    let outcomes = client.set_all(&targets).await.unwrap();
    assert!(outcomes[&targets[0].0]);
    assert!(!outcomes[&targets[1].0]);
    assert!(outcomes[&targets[2].0]);
}

#[tokio::test]
async fn throttled_set_survives_a_timed_out_target() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, false).await;

    let targets = [
        (ospf_cost_target(10, 0, 0, 1), Value::Integer(1)),
        (ospf_cost_target(10, 0, 0, 2), Value::Integer(2)),
        (ospf_cost_target(10, 0, 0, 3), Value::Integer(3)),
    ];

    // Swallow the first target's request and its retransmission; the
    // remaining targets must still be processed.
    agent.drop_requests(2);

    let outcomes = client.set_all(&targets).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes[&targets[0].0]);
    assert!(outcomes[&targets[1].0]);
    assert!(outcomes[&targets[2].0]);
}

#[tokio::test]
async fn throttled_set_paces_requests() {
    let agent = TestAgent::new().await;
    let client = Client::builder(agent.addr().to_string(), "public")
        .timeout(Duration::from_millis(200))
        .set_interval(Duration::from_millis(60))
        .connect()
        .await
        .unwrap();

    let targets = [
        (ospf_cost_target(10, 0, 0, 1), Value::Integer(1)),
        (ospf_cost_target(10, 0, 0, 2), Value::Integer(2)),
        (ospf_cost_target(10, 0, 0, 3), Value::Integer(3)),
    ];

    let start = Instant::now();
    let outcomes = client.set_all(&targets).await.unwrap();
    let elapsed = start.elapsed();

    assert!(outcomes.values().all(|&accepted| accepted));
    // Two inter-request pauses of 60 ms each.
    assert!(elapsed >= Duration::from_millis(120), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let agent = TestAgent::new().await;
    for cumulative in [true, false] {
        let client = client_for(&agent, cumulative).await;
        let outcomes = client.set_all(&[]).await.unwrap();
        assert!(outcomes.is_empty());
    }
}

#[tokio::test]
async fn get_all_maps_targets_to_values() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, false).await;

    let cost1 = ospf_cost_target(10, 0, 0, 1);
    let cost2 = ospf_cost_target(10, 0, 0, 2);
    agent.set(cost1.clone(), Value::Integer(11));
    agent.set(cost2.clone(), Value::Integer(22));

    let values = client
        .get_all(&[cost1.clone(), cost2.clone()])
        .await
        .unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[&cost1], Value::Integer(11));
    assert_eq!(values[&cost2], Value::Integer(22));
}

#[tokio::test]
async fn get_all_propagates_syntax_errors() {
    let agent = TestAgent::new().await;
    let client = client_for(&agent, false).await;

    let missing = ospf_cost_target(10, 99, 99, 99);
    let err = client.get_all(&[missing.clone()]).await.unwrap_err();
    match *err {
        Error::Syntax { ref oid, .. } => assert_eq!(oid, &missing),
        ref other => panic!("expected Syntax error, got {other:?}"),
    }
}
