use crate::commands::setup::find_user;
use crate::utils::{config::AdminConfig, gateway::Gateway};
use log::{error, info, warn};
use serde_json::{Map, Value};

/// Either name counts as membership in the administrators group.
pub const ADMIN_GROUP_NAMES: [&str; 2] = ["builtin_administrators", "administrators"];
pub const SUDO_GROUP_NAME: &str = "sudo";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub label: &'static str,
    pub passed: bool,
}

fn in_groups(record: &Map<String, Value>, names: &[&str]) -> bool {
    record
        .get("groups_names")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(Value::as_str)
                .any(|group| names.contains(&group))
        })
        .unwrap_or(false)
}

/// Compares a user record read back from the middleware against `config`.
pub fn compare(config: &AdminConfig, record: &Map<String, Value>) -> Vec<Check> {
    let full_name = record.get("full_name").and_then(Value::as_str);
    let ssh_key = record
        .get("sshpubkey")
        .and_then(Value::as_str)
        .unwrap_or("");
    vec![
        Check {
            label: "Full Name",
            passed: full_name == Some(config.full_name.as_str()),
        },
        Check {
            label: "SSH Key Present",
            passed: ssh_key.contains(config.ssh_pub_key.trim()),
        },
        Check {
            label: "Admin Group",
            passed: in_groups(record, &ADMIN_GROUP_NAMES),
        },
        Check {
            label: "Sudo Group",
            passed: in_groups(record, &[SUDO_GROUP_NAME]),
        },
    ]
}

/// Re-reads user `user_id` and reports each check. Returns `None` if the
/// record could not be read or came back empty. Failed checks are only reported.
pub fn verify_user(config: &AdminConfig, gateway: &dyn Gateway, user_id: u64) -> Option<Vec<Check>> {
    info!("--- Verifying User: {} ---", config.username);
    let reply = gateway.call("user.get_instance", &[&user_id.to_string()]);
    let record = match reply.as_value() {
        Some(Value::Object(record)) if !record.is_empty() => record,
        _ => {
            error!("  [X] Verification Failed: Could not retrieve user data.");
            return None;
        }
    };

    let checks = compare(config, record);
    for check in &checks {
        if check.passed {
            info!("  [✓] {}", check.label);
        } else {
            warn!("  [X] {}", check.label);
        }
    }
    if checks.iter().all(|check| check.passed) {
        info!(
            "SUCCESS: User '{}' is fully configured and verified.",
            config.username
        );
    } else {
        warn!("WARNING: Some verification checks failed. Review the output above.");
    }
    Some(checks)
}

/// Verifies the configured user without changing anything.
pub fn main(config: &AdminConfig, gateway: &dyn Gateway) -> Option<Vec<Check>> {
    match find_user(gateway, &config.username) {
        Some(user_id) => verify_user(config, gateway, user_id),
        None => {
            error!("  [X] Verification Failed: User '{}' not found.", config.username);
            None
        }
    }
}
