//! User and account data (`user-data`)

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::Document;

/// Account definition within [`UserData`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,

    #[serde(
        rename = "ssh-authorized-keys",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ssh_authorized_keys: Vec<String>,

    /// Sudo rule, e.g. `ALL=(ALL) NOPASSWD:ALL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_passwd: Option<bool>,

    /// Password hash in `/etc/shadow` format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
}

/// Cloud-config user data.
///
/// Serializes with the `#cloud-config` marker line cloud-init requires to
/// recognize the dialect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(skip)]
    raw: Mapping,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
}

impl Document for UserData {
    const FILE_NAME: &'static str = "user-data";
    const HEADER: Option<&'static str> = Some("#cloud-config");

    fn raw(&self) -> &Mapping {
        &self.raw
    }

    fn set_raw(&mut self, raw: Mapping) {
        self.raw = raw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    #[test]
    fn test_marshal_starts_with_marker() {
        let ud = UserData::default();
        let out = String::from_utf8(ud.marshal().unwrap()).unwrap();
        assert!(out.starts_with("#cloud-config\n"));
    }

    #[test]
    fn test_unknown_field_survives_partial_override() {
        let input = b"#cloud-config\nunsupported_field: blabla\nusers:\n- name: sepp\n  lock_passwd: false\n";
        let mut ud = UserData::unmarshal(input).unwrap();

        assert_eq!(
            ud.raw().get("unsupported_field"),
            Some(&Value::String("blabla".to_string()))
        );
        assert_eq!(ud.users.len(), 1);
        assert_eq!(ud.users[0].name, "sepp");
        assert_eq!(ud.users[0].lock_passwd, Some(false));

        ud.users[0].name = "vreni".to_string();

        let output = ud.marshal().unwrap();
        let reparsed: Value = serde_yaml::from_slice(&output).unwrap();
        assert_eq!(
            reparsed["unsupported_field"],
            Value::String("blabla".to_string())
        );

        let ud1 = UserData::unmarshal(&output).unwrap();
        assert_eq!(ud1.users.len(), 1);
        assert_eq!(ud1.users[0].name, "vreni");
    }

    #[test]
    fn test_round_trip() {
        let ud = UserData {
            users: vec![User {
                name: "admin".to_string(),
                ssh_authorized_keys: vec!["ssh-ed25519 AAAA admin@host".to_string()],
                sudo: Some("ALL=(ALL) NOPASSWD:ALL".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let out = ud.marshal().unwrap();
        let ud2 = UserData::unmarshal(&out).unwrap();
        assert_eq!(ud.to_mapping().unwrap(), ud2.to_mapping().unwrap());
    }
}
