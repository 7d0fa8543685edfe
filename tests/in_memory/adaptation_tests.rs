//! In-memory integration tests for proxy tools and their invocation.

use super::helpers::{Environment, calculator_agent, environment, identity_agent};
use rstest::rstest;
use serde_json::json;
use switchboard::bridge::{
    domain::ToolName,
    ports::{ExchangeError, ToolServer},
    services::{InvocationError, ToolCallError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identity_agent_round_trip(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start_on_demand_only().await.expect("bridge should start");
    let context = lifespan.context().clone();

    let registered = context
        .register_now(agent_id)
        .await
        .expect("registration should succeed");
    let tool_name = ToolName::for_action(agent_id, "identity");
    let description = registered.get(&tool_name).expect("identity tool registered");
    assert!(description.contains("Return the value unchanged."));
    assert!(description.contains("(value: Any) -> Any"));

    let echoed = context
        .call(tool_name.as_str(), json!({"args": ["hello"], "kwargs": {}}))
        .await
        .expect("call should succeed");
    assert_eq!(echoed, json!("hello"));

    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn keyword_arguments_reach_the_action(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(calculator_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start_on_demand_only().await.expect("bridge should start");
    let context = lifespan.context().clone();
    context
        .register_now(agent_id)
        .await
        .expect("registration should succeed");

    let sum = context
        .call(
            ToolName::for_action(agent_id, "add").as_str(),
            json!({"args": [], "kwargs": {"a": 2, "b": 40}}),
        )
        .await
        .expect("add should succeed");
    let negated = context
        .call(
            ToolName::for_action(agent_id, "negate").as_str(),
            json!({"args": [7], "kwargs": {}}),
        )
        .await
        .expect("negate should succeed");

    assert_eq!(sum, json!(42));
    assert_eq!(negated, json!(-7));
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn terminated_agent_tool_is_removed_lazily(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(identity_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start_on_demand_only().await.expect("bridge should start");
    let context = lifespan.context().clone();
    context
        .register_now(agent_id)
        .await
        .expect("registration should succeed");
    let tool_name = ToolName::for_action(agent_id, "identity");

    environment
        .exchange
        .terminate(agent_id)
        .expect("terminate should succeed");
    let still_listed = environment
        .server
        .get_tool(&tool_name)
        .await
        .expect("lookup should succeed");
    assert!(still_listed.is_some());

    let first = context
        .call(tool_name.as_str(), json!({"args": [1], "kwargs": {}}))
        .await;
    assert!(matches!(
        first,
        Err(ToolCallError::Invocation(InvocationError::TargetUnreachable {
            source: ExchangeError::MailboxTerminated(id),
            ..
        })) if id == agent_id
    ));

    let second = context
        .call(tool_name.as_str(), json!({"args": [1], "kwargs": {}}))
        .await;
    assert!(matches!(second, Err(ToolCallError::ToolNotFound(_))));
    lifespan.stop().await.expect("bridge should stop");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_action_keeps_its_tool(environment: Environment) {
    let agent_id = environment
        .exchange
        .launch(calculator_agent().expect("valid agent"))
        .expect("launch should succeed");
    let lifespan = environment.start_on_demand_only().await.expect("bridge should start");
    let context = lifespan.context().clone();
    context
        .register_now(agent_id)
        .await
        .expect("registration should succeed");
    let tool_name = ToolName::for_action(agent_id, "add");

    let result = context
        .call(tool_name.as_str(), json!({"args": [], "kwargs": {"a": 1}}))
        .await;

    assert!(matches!(
        result,
        Err(ToolCallError::Invocation(InvocationError::Exchange(
            ExchangeError::ActionFailed { .. }
        )))
    ));
    assert!(
        environment
            .server
            .get_tool(&tool_name)
            .await
            .expect("lookup should succeed")
            .is_some()
    );
    lifespan.stop().await.expect("bridge should stop");
}
