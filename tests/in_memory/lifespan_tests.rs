//! In-memory integration tests for starting and stopping the bridge.

use super::helpers::{Environment, TestLifespan, environment, identity_agent};
use crate::test_helpers::EnvVarGuard;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use switchboard::bridge::{
    domain::{
        AuthMethod, ConfigurationError, EXCHANGE_ADDRESS_ENV, EXCHANGE_AUTH_ENV,
        REFRESH_INTERVAL_ENV, ToolName,
    },
    services::{BridgeLifespan, LifespanError},
};

async fn start_from_env(environment: &Environment) -> Result<TestLifespan, LifespanError> {
    BridgeLifespan::start_from_env(
        &environment.connector,
        Arc::clone(&environment.server),
        Arc::new(DefaultClock),
    )
    .await
}

fn all_connections_closed(environment: &Environment) -> bool {
    environment
        .connector
        .issued()
        .expect("issued connections should list")
        .iter()
        .all(|client| client.is_closed())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_from_env_reads_the_exchange_settings(environment: Environment) {
    let lifespan = {
        let _guard = EnvVarGuard::set_many(&[
            (EXCHANGE_ADDRESS_ENV, Some("https://exchange.example.org")),
            (EXCHANGE_AUTH_ENV, Some("globus")),
            (REFRESH_INTERVAL_ENV, Some("45")),
        ]);
        start_from_env(&environment)
            .await
            .expect("bridge should start")
    };

    let config = lifespan.context().config();
    assert_eq!(config.address(), "https://exchange.example.org");
    assert_eq!(config.auth_method(), Some(AuthMethod::Globus));
    assert_eq!(config.refresh_interval(), Duration::from_secs(45));
    lifespan.stop().await.expect("bridge should stop");
    assert!(all_connections_closed(&environment));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_address_fails_before_connecting(environment: Environment) {
    let result = {
        let _guard = EnvVarGuard::set_many(&[
            (EXCHANGE_ADDRESS_ENV, None),
            (EXCHANGE_AUTH_ENV, None),
            (REFRESH_INTERVAL_ENV, None),
        ]);
        start_from_env(&environment).await
    };

    assert!(matches!(
        result,
        Err(LifespanError::Configuration(
            ConfigurationError::MissingExchangeAddress { .. }
        ))
    ));
    assert!(
        environment
            .connector
            .issued()
            .expect("issued connections should list")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_auth_method_is_rejected(environment: Environment) {
    let result = {
        let _guard = EnvVarGuard::set_many(&[
            (EXCHANGE_ADDRESS_ENV, Some("http://localhost:8700")),
            (EXCHANGE_AUTH_ENV, Some("kerberos")),
            (REFRESH_INTERVAL_ENV, None),
        ]);
        start_from_env(&environment).await
    };

    assert!(matches!(
        result,
        Err(LifespanError::Configuration(
            ConfigurationError::UnsupportedAuthMethod(_)
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scope_releases_the_connection_after_the_body(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment
        .start_on_demand_only()
        .await
        .expect("bridge should start");

    let registered = lifespan
        .scope(|context| async move { context.register_now(agent_id).await })
        .await
        .expect("scope should stop cleanly")
        .expect("registration should succeed");

    assert!(registered.contains_key(&ToolName::for_action(agent_id, "identity")));
    assert!(all_connections_closed(&environment));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn control_tools_are_listed_after_start(environment: Environment) {
    let lifespan = environment
        .start_on_demand_only()
        .await
        .expect("bridge should start");

    let names = environment
        .server
        .tool_names()
        .expect("names should list")
        .into_iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["add_agent", "discover_agents"]);
    lifespan.stop().await.expect("bridge should stop");
}
