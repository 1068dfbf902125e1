//! Tests for interactive input and command resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::expression::ConfigurationExpression;
use crate::platform::Platform;
use crate::variables::{
    ConfigurationResolver, ConfigurationResolverService, MockCommandRunner, MockInputPrompter,
    StaticExecutionContext, VariableError, VariableResolver, WorkspaceFolder,
};
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

type TestService =
    ConfigurationResolverService<StaticExecutionContext, MockInputPrompter, MockCommandRunner>;

fn context() -> StaticExecutionContext {
    StaticExecutionContext::new().with_setting(
        "mcp.inputs",
        json!([
            {"id": "apiKey", "type": "promptString", "password": true, "description": "API key"},
            {"id": "region", "type": "pickString", "options": ["eu", {"label": "United States", "value": "us"}]},
            {"id": "token", "type": "command", "command": "auth.token", "args": {"scope": "read"}}
        ]),
    )
}

fn service(prompter: MockInputPrompter, commands: MockCommandRunner) -> TestService {
    let resolver = VariableResolver::new(Arc::new(context())).with_platform(Platform::Linux);
    ConfigurationResolverService::new(resolver, Arc::new(prompter), Arc::new(commands))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prompts_for_declared_inputs_and_records_them() {
    let mut prompter = MockInputPrompter::new();
    prompter
        .expect_prompt_string()
        .withf(|request| request.id == "apiKey" && request.password)
        .times(1)
        .returning(|_| Some("s3cret".to_owned()));
    prompter
        .expect_pick_string()
        .withf(|request| request.options.len() == 2)
        .times(1)
        .returning(|_| Some("us".to_owned()));
    let mut commands = MockCommandRunner::new();
    commands
        .expect_execute()
        .with(eq("auth.token"), eq(json!({"scope": "read"})))
        .times(1)
        .returning(|_, _| Ok(Some("tok".to_owned())));
    let service = service(prompter, commands);
    let mut expression = ConfigurationExpression::parse_for_platform(
        json!({"env": {"KEY": "${input:apiKey}", "REGION": "${input:region}", "TOKEN": "${input:token}"}}),
        Platform::Linux,
    );

    let collected = service
        .resolve_with_interaction(None, &mut expression, Some("mcp"), None)
        .await
        .expect("interaction should succeed")
        .expect("user should not cancel");

    assert_eq!(collected.get("input:apiKey").map(String::as_str), Some("s3cret"));
    assert_eq!(
        expression.to_object(),
        json!({"env": {"KEY": "s3cret", "REGION": "us", "TOKEN": "tok"}})
    );
    let secrets = expression
        .resolved()
        .filter(|(_, resolution)| resolution.is_secret())
        .map(|(replacement, _)| replacement.id().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(secrets, ["${input:apiKey}"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interaction_leaves_non_interactive_variables_alone() {
    let service = service(MockInputPrompter::new(), MockCommandRunner::new());
    let mut expression = ConfigurationExpression::parse_for_platform(
        json!({"command": "${workspaceFolder}/run"}),
        Platform::Linux,
    );

    let collected = service
        .resolve_with_interaction(None, &mut expression, Some("mcp"), None)
        .await
        .expect("interaction should succeed")
        .expect("nothing to cancel");

    assert!(collected.is_empty());
    assert!(expression.has_unresolved());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn defaults_prefill_prompts() {
    let mut prompter = MockInputPrompter::new();
    prompter
        .expect_prompt_string()
        .withf(|request| request.default.as_deref() == Some("previous"))
        .times(1)
        .returning(|request| request.default.clone());
    let service = service(prompter, MockCommandRunner::new());
    let mut expression =
        ConfigurationExpression::parse_for_platform(json!("${input:apiKey}"), Platform::Linux);
    let defaults = HashMap::from([("input:apiKey".to_owned(), "previous".to_owned())]);

    service
        .resolve_with_interaction(None, &mut expression, Some("mcp"), Some(&defaults))
        .await
        .expect("interaction should succeed");

    assert_eq!(expression.to_object(), json!("previous"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dismissed_prompt_cancels_resolution() {
    let mut prompter = MockInputPrompter::new();
    prompter.expect_prompt_string().returning(|_| None);
    let service = service(prompter, MockCommandRunner::new());
    let mut expression =
        ConfigurationExpression::parse_for_platform(json!("${input:apiKey}"), Platform::Linux);

    let outcome = service
        .resolve_with_interaction(None, &mut expression, Some("mcp"), None)
        .await
        .expect("cancellation is not an error");

    assert!(outcome.is_none());
    assert!(expression.has_unresolved());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undeclared_input_is_an_error() {
    let service = service(MockInputPrompter::new(), MockCommandRunner::new());
    let mut expression =
        ConfigurationExpression::parse_for_platform(json!("${input:unknown}"), Platform::Linux);

    let result = service
        .resolve_with_interaction(None, &mut expression, Some("mcp"), None)
        .await;

    assert!(matches!(result, Err(VariableError::UndefinedInput { id }) if id == "unknown"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn command_variables_run_the_named_command() {
    let mut commands = MockCommandRunner::new();
    commands
        .expect_execute()
        .with(eq("pick.process"), eq(Value::Null))
        .times(1)
        .returning(|_, _| Ok(Some("1234".to_owned())));
    let service = service(MockInputPrompter::new(), commands);
    let mut expression = ConfigurationExpression::parse_for_platform(
        json!({"args": ["--pid=${command:pick.process}"]}),
        Platform::Linux,
    );

    service
        .resolve_with_interaction(None, &mut expression, None, None)
        .await
        .expect("interaction should succeed");

    assert_eq!(expression.to_object(), json!({"args": ["--pid=1234"]}));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_async_finishes_remaining_variables() {
    let service = service(MockInputPrompter::new(), MockCommandRunner::new());
    let folder = WorkspaceFolder::new("project", "/work/project");
    let expression = ConfigurationExpression::parse_for_platform(
        json!({"command": "${workspaceFolder}/run"}),
        Platform::Linux,
    );

    let value = service
        .resolve_async(Some(&folder), expression)
        .await
        .expect("resolution should succeed");

    assert_eq!(value, json!({"command": "/work/project/run"}));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_async_rejects_unanswered_inputs() {
    let service = service(MockInputPrompter::new(), MockCommandRunner::new());
    let expression =
        ConfigurationExpression::parse_for_platform(json!("${input:apiKey}"), Platform::Linux);

    let result = service.resolve_async(None, expression).await;

    assert!(matches!(result, Err(VariableError::MissingMappedValue { .. })));
}
