//! Actions operations shared by the organization and repository facades.
//!
//! Variables, secrets and self-hosted runners exist at both scopes with
//! identical endpoint shapes under `{root}/actions/...`.

use crate::client::GitHubClient;
use crate::errors::{GitHubError, GitHubResult};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct VariablePayload<'a> {
    name: &'a str,
    value: &'a str,
}

pub(crate) async fn add_variable(
    client: &GitHubClient,
    root: &str,
    name: &str,
    value: &str,
) -> GitHubResult<()> {
    client
        .post(
            &format!("{}/actions/variables", root),
            &VariablePayload { name, value },
        )
        .await?;
    Ok(())
}

pub(crate) async fn delete_variable(
    client: &GitHubClient,
    root: &str,
    name: &str,
) -> GitHubResult<()> {
    client
        .delete(&format!("{}/actions/variables/{}", root, name))
        .await?;
    Ok(())
}

pub(crate) async fn list_variables(client: &GitHubClient, root: &str) -> GitHubResult<Vec<Value>> {
    let body = client.get(&format!("{}/actions/variables", root)).await?;
    collection(body, "variables")
}

pub(crate) async fn list_secrets(client: &GitHubClient, root: &str) -> GitHubResult<Vec<Value>> {
    let body = client.get(&format!("{}/actions/secrets", root)).await?;
    collection(body, "secrets")
}

pub(crate) async fn list_runners(client: &GitHubClient, root: &str) -> GitHubResult<Vec<Value>> {
    let body = client.get(&format!("{}/actions/runners", root)).await?;
    collection(body, "runners")
}

pub(crate) async fn delete_runner(
    client: &GitHubClient,
    root: &str,
    runner_id: u64,
) -> GitHubResult<()> {
    client
        .delete(&format!("{}/actions/runners/{}", root, runner_id))
        .await?;
    Ok(())
}

/// Pulls the named collection out of a keyed list response.
pub(crate) fn collection(body: Value, key: &str) -> GitHubResult<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(GitHubError::deserialization(format!(
                "Response has no `{}` array",
                key
            ))),
        },
        other => Err(GitHubError::deserialization(format!(
            "Expected an object with `{}`, got {}",
            key, other
        ))),
    }
}
