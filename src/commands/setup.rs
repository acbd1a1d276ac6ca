use crate::commands::verify::{verify_user, Check};
use crate::utils::{
    config::AdminConfig,
    gateway::{CallResult, Gateway},
};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Groups the account is placed in, resolved to IDs through `group.query`.
pub const TARGET_GROUPS: [&str; 2] = ["builtin_administrators", "sudo"];
pub const SSH_SERVICE: &str = "ssh";

/// What a provisioning run ended up doing.
#[derive(Debug, Default)]
pub struct Provisioned {
    pub user_id: Option<u64>,
    pub created: bool,
    pub groups: Vec<u64>,
    pub unresolved_groups: Vec<&'static str>,
    pub ssh_hardened: bool,
    pub checks: Option<Vec<Check>>,
}

/// Reads a record ID from either a bare number or a record carrying `id`.
pub fn record_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::Object(record) => record.get("id").and_then(Value::as_u64),
        _ => None,
    }
}

fn first_match(result: &CallResult) -> Option<&Value> {
    match result.as_value()? {
        Value::Array(items) => items.first(),
        _ => None,
    }
}

pub fn resolve_groups(gateway: &dyn Gateway) -> (Vec<u64>, Vec<&'static str>) {
    let listing = gateway.call("group.query", &[]);
    let mut by_name: HashMap<&str, u64> = HashMap::new();
    match listing.as_value() {
        Some(Value::Array(groups)) => {
            for group in groups {
                if let (Some(name), Some(id)) = (
                    group.get("group").and_then(Value::as_str),
                    group.get("id").and_then(Value::as_u64),
                ) {
                    by_name.insert(name, id);
                }
            }
        }
        _ => error!("Failed to list groups"),
    }

    let mut ids = Vec::new();
    let mut unresolved = Vec::new();
    for name in TARGET_GROUPS {
        match by_name.get(name) {
            Some(id) => ids.push(*id),
            None => unresolved.push(name),
        }
    }
    if !unresolved.is_empty() {
        warn!(
            "Group(s) not found and skipped: {}",
            unresolved.join(", ")
        );
    }
    (ids, unresolved)
}

/// Looks up the ID of the user named `username`, if one exists.
pub fn find_user(gateway: &dyn Gateway, username: &str) -> Option<u64> {
    let filter = json!([["username", "=", username]]).to_string();
    let existing = gateway.call("user.query", &[&filter]);
    if existing.is_absent() {
        warn!("Could not query for user {}", username);
    }
    first_match(&existing).and_then(record_id)
}

pub fn user_payload(config: &AdminConfig, groups: &[u64]) -> Value {
    json!({
        "username": config.username,
        "full_name": config.full_name,
        "password": config.password,
        "sshpubkey": config.ssh_pub_key,
        "groups": groups,
        // kept enabled for Web UI access
        "password_disabled": false,
        "shell": config.shell,
    })
}

fn upsert_user(config: &AdminConfig, gateway: &dyn Gateway, groups: &[u64]) -> (Option<u64>, bool) {
    let mut payload = user_payload(config, groups);
    match find_user(gateway, &config.username) {
        Some(user_id) => {
            info!("[>] Updating existing user (ID: {})...", user_id);
            let id_arg = user_id.to_string();
            if gateway
                .call("user.update", &[&id_arg, &payload.to_string()])
                .is_absent()
            {
                error!("Failed to update user {}", config.username);
            }
            (Some(user_id), false)
        }
        None => {
            info!("[>] Creating new user...");
            // asks the middleware for a matching primary group
            payload["group_create"] = Value::Bool(true);
            let created = gateway.call("user.create", &[&payload.to_string()]);
            let user_id = created.as_value().and_then(record_id);
            match user_id {
                Some(id) => info!("Created user {} with ID {}", config.username, id),
                None => error!("Failed to create user {}", config.username),
            }
            (user_id, true)
        }
    }
}

/// Disables SSH password and root login, then restarts the service.
pub fn harden_ssh(gateway: &dyn Gateway) -> bool {
    info!("--- Hardening SSH Service ---");
    let filter = json!([["service", "=", SSH_SERVICE]]).to_string();
    if first_match(&gateway.call("service.query", &[&filter])).is_none() {
        debug!("No {} service found, skipping hardening", SSH_SERVICE);
        return false;
    }
    let settings = json!({
        "password_login": false,
        "root_login": false,
    })
    .to_string();
    let updated = !gateway
        .call("service.update", &[SSH_SERVICE, &settings])
        .is_absent();
    if !updated {
        error!("Failed to update {} service", SSH_SERVICE);
    }
    let restarted = !gateway.call("service.restart", &[SSH_SERVICE]).is_absent();
    if !restarted {
        error!("Failed to restart {} service", SSH_SERVICE);
    }
    if updated && restarted {
        info!("  [✓] SSH password and root login disabled.");
    }
    updated && restarted
}

/// Creates or updates the admin account, hardens SSH and verifies the result.
///
/// `config` must already be validated. Failed calls are logged and the run
/// carries on with whatever it has.
pub fn provision(config: &AdminConfig, gateway: &dyn Gateway) -> Provisioned {
    info!("--- Setting up User: {} ---", config.username);
    let (groups, unresolved_groups) = resolve_groups(gateway);
    let (user_id, created) = upsert_user(config, gateway, &groups);
    let ssh_hardened = harden_ssh(gateway);
    let checks = user_id.and_then(|id| verify_user(config, gateway, id));
    Provisioned {
        user_id,
        created,
        groups,
        unresolved_groups,
        ssh_hardened,
        checks,
    }
}
