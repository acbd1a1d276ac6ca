use crate::error::Error;
use log::{error, info};
use serde::Deserialize;
use std::{fmt, fs, path::Path};

// --- Edit these before running without a config file ---
const ADMIN_USER: &str = "";
const ADMIN_PASS: &str = "";
const ADMIN_FULLNAME: &str = "";
const SSH_PUB_KEY: &str = "";

pub const DEFAULT_SHELL: &str = "/usr/bin/zsh";

fn default_shell() -> String {
    DEFAULT_SHELL.to_owned()
}

/// Desired state of the administrative account.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub ssh_pub_key: String,
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl AdminConfig {
    pub fn new(username: &str, password: &str, full_name: &str, ssh_pub_key: &str) -> AdminConfig {
        AdminConfig {
            username: username.to_owned(),
            password: password.to_owned(),
            full_name: full_name.to_owned(),
            ssh_pub_key: ssh_pub_key.to_owned(),
            shell: default_shell(),
        }
    }

    /// The values compiled into the binary.
    pub fn builtin() -> AdminConfig {
        AdminConfig::new(ADMIN_USER, ADMIN_PASS, ADMIN_FULLNAME, SSH_PUB_KEY)
    }

    pub fn from_file(path: &Path) -> Result<AdminConfig, Error> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Names of all required fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("username", &self.username),
            ("password", &self.password),
            ("full_name", &self.full_name),
            ("ssh_pub_key", &self.ssh_pub_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), Error> {
        let fields = self.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingConfig { fields })
        }
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("ssh_pub_key", &self.ssh_pub_key)
            .field("shell", &self.shell)
            .finish()
    }
}

/// Validates `config` and logs the outcome. `main` turns the error into a
/// failing exit status.
pub fn ensure_valid(config: &AdminConfig) -> Result<(), Error> {
    if let Err(err) = config.validate() {
        error!("ERROR: {}", err);
        return Err(err);
    }
    info!("  [✓] Configuration validated.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use testresult::TestResult;

    fn complete() -> AdminConfig {
        AdminConfig::new("admin", "hunter2", "NAS Admin", "ssh-ed25519 AAAAC3Nza admin@host")
    }

    #[test]
    fn complete_config_validates() {
        assert!(complete().validate().is_ok());
    }

    #[rstest]
    #[case::username(AdminConfig::new("", "p", "n", "k"), vec!["username"])]
    #[case::whitespace_password(AdminConfig::new("u", "  \t", "n", "k"), vec!["password"])]
    #[case::name_and_key(AdminConfig::new("u", "p", " ", ""), vec!["full_name", "ssh_pub_key"])]
    #[case::everything(
        AdminConfig::new("", "", "", "\n"),
        vec!["username", "password", "full_name", "ssh_pub_key"]
    )]
    fn missing_fields_are_all_reported(#[case] config: AdminConfig, #[case] expected: Vec<&str>) {
        assert_eq!(config.missing_fields(), expected);
        let message = config.validate().unwrap_err().to_string();
        for field in expected {
            assert!(message.contains(field), "{message} lacks {field}");
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("admin"));
    }

    #[test]
    fn ensure_valid_rejects_incomplete_config() {
        let result = ensure_valid(&AdminConfig::new("admin", "", "NAS Admin", " "));
        match result {
            Err(Error::MissingConfig { fields }) => assert_eq!(fields, ["password", "ssh_pub_key"]),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(ensure_valid(&complete()).is_ok());
    }

    #[test]
    fn file_config_defaults_shell() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            br#"{"username":"admin","password":"pw","full_name":"Admin","ssh_pub_key":"ssh-rsa AAA"}"#,
        )?;
        let config = AdminConfig::from_file(file.path())?;
        assert_eq!(config.shell, DEFAULT_SHELL);
        assert_eq!(config.username, "admin");
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            br#"{"username":"a","password":"b","full_name":"c","ssh_pub_key":"d","uid":0}"#,
        )?;
        let result = AdminConfig::from_file(file.path());
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = AdminConfig::from_file(Path::new("/nonexistent/nas_bootstrap.json"));
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }
}
