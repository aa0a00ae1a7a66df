//! Generated defaults (highest-precedence layer)
//!
//! The default generator fills a minimal config from a machine name plus
//! user and SSH key. Process-local context (current user, default key
//! path) is resolved once into [`LocalDefaults`] and passed in explicitly,
//! so the core stays testable without OS environment dependencies.

use std::path::PathBuf;

use super::Config;
use crate::document::{MetaData, User, UserData};

/// Process-local defaults resolved once at startup
#[derive(Debug, Clone)]
pub struct LocalDefaults {
    /// Login name of the invoking user
    pub user: String,
    /// Default SSH public key file
    pub ssh_key_path: PathBuf,
}

impl LocalDefaults {
    /// Resolve from the environment: `$USER` (falling back to `root`) and
    /// `~/.ssh/id_rsa.pub`
    pub fn discover() -> Self {
        let user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
        let ssh_key_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/root"))
            .join(".ssh")
            .join("id_rsa.pub");
        Self { user, ssh_key_path }
    }
}

/// Build the minimal default config for a machine: hostname and instance
/// id from the name, one sudo user with an SSH key and an optional
/// password hash
pub fn default_config(
    name: &str,
    user: &str,
    ssh_pub_key: &str,
    password_hash: Option<&str>,
) -> Config {
    let user = User {
        name: user.to_string(),
        sudo: Some("ALL=(ALL) NOPASSWD:ALL".to_string()),
        ssh_authorized_keys: vec![ssh_pub_key.trim_end().to_string()],
        lock_passwd: password_hash.map(|_| false),
        passwd: password_hash.map(str::to_string),
    };

    let mut meta_data = MetaData::default();
    meta_data.hostname = Some(name.to_string());
    meta_data.instance_id = Some(name.to_string());

    let mut user_data = UserData::default();
    user_data.users = vec![user];

    Config {
        meta_data: Some(meta_data),
        user_data: Some(user_data),
        network_config: None,
    }
}
