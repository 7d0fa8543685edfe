//! In-memory integration tests for the periodic reconciliation loop.
//!
//! Time is paused so the refresh interval elapses deterministically.

use super::helpers::{Environment, calculator_agent, environment, exchange_config, identity_agent};
use rstest::rstest;
use std::time::Duration;
use switchboard::bridge::domain::{DiscoveryFilter, ToolName};

const INTERVAL: Duration = Duration::from_secs(60);

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn startup_cycle_registers_running_agents(environment: Environment) {
    let identity = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let calculator = environment
        .exchange
        .launch(calculator_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start(INTERVAL).await.expect("bridge should start");

    advance(Duration::from_secs(1)).await;

    assert_eq!(
        environment
            .server
            .tools_for_agent(identity)
            .expect("tools should list"),
        vec![ToolName::for_action(identity, "identity")]
    );
    assert_eq!(
        environment
            .server
            .tools_for_agent(calculator)
            .expect("tools should list")
            .len(),
        2
    );
    assert_eq!(lifespan.context().known().len(), 2);
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn late_agents_wait_for_the_next_cycle(environment: Environment) {
    let lifespan = environment.start(INTERVAL).await.expect("bridge should start");
    advance(Duration::from_secs(1)).await;

    let late = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    advance(Duration::from_secs(1)).await;
    assert!(
        environment
            .server
            .tools_for_agent(late)
            .expect("tools should list")
            .is_empty()
    );

    advance(INTERVAL).await;
    assert_eq!(
        environment
            .server
            .tools_for_agent(late)
            .expect("tools should list")
            .len(),
        1
    );
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn known_agents_are_not_claimed_twice(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start(INTERVAL).await.expect("bridge should start");
    advance(Duration::from_secs(1)).await;
    let first_seen = lifespan.context().known().first_seen(agent_id);

    advance(INTERVAL * 2).await;

    assert!(first_seen.is_some());
    assert_eq!(lifespan.context().known().first_seen(agent_id), first_seen);
    assert_eq!(lifespan.context().known().len(), 1);
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn configured_filter_limits_registration(environment: Environment) {
    let identity = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let calculator = environment
        .exchange
        .launch(calculator_agent().expect("valid agent"))
        .expect("launch should succeed");
    let filter = DiscoveryFilter::new("MathAgent")
        .and_then(|math| math.with_module("demo.agents"))
        .expect("valid filter");
    let config = exchange_config()
        .expect("valid config")
        .with_filter(filter);
    let lifespan = environment
        .start_with(config)
        .await
        .expect("bridge should start");

    advance(Duration::from_secs(1)).await;

    assert!(lifespan.context().known().contains(calculator));
    assert!(!lifespan.context().known().contains(identity));
    assert!(
        environment
            .server
            .tools_for_agent(identity)
            .expect("tools should list")
            .is_empty()
    );
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_adaptation_does_not_delay_later_cycles(environment: Environment) {
    let slow = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    environment
        .exchange
        .delay_catalog(slow, Duration::from_secs(3600))
        .expect("delay should apply");
    let lifespan = environment.start(INTERVAL).await.expect("bridge should start");
    advance(Duration::from_secs(1)).await;

    let quick = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    advance(INTERVAL).await;

    assert_eq!(
        environment
            .server
            .tools_for_agent(quick)
            .expect("tools should list")
            .len(),
        1
    );
    assert!(
        environment
            .server
            .tools_for_agent(slow)
            .expect("tools should list")
            .is_empty()
    );
    let cancelled = lifespan.stop().await.expect("bridge should stop");
    assert_eq!(cancelled.aborted_tasks, 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn discovery_outage_does_not_stop_the_loop(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    environment
        .exchange
        .set_discovery_outage(Some("exchange offline".to_owned()))
        .expect("outage should apply");
    let lifespan = environment.start(INTERVAL).await.expect("bridge should start");
    advance(Duration::from_secs(1)).await;
    assert!(lifespan.context().known().is_empty());

    environment
        .exchange
        .set_discovery_outage(None)
        .expect("outage should clear");
    advance(INTERVAL).await;

    assert!(lifespan.context().known().contains(agent_id));
    assert_eq!(
        environment
            .server
            .tools_for_agent(agent_id)
            .expect("tools should list"),
        vec![ToolName::for_action(agent_id, "identity")]
    );
    lifespan.stop().await.expect("bridge should stop");
}
