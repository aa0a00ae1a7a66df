//! End-to-end layering tests: directories fold in order, later layers win,
//! unknown fields survive, generated defaults apply last.

use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use cloudseed::config::{config_from_dirs, default_config};
use cloudseed::document::Document;

#[test]
fn later_directory_wins_on_overlapping_keys() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(a.path().join("meta-data"), "local-hostname: a\n").unwrap();
    fs::write(b.path().join("meta-data"), "local-hostname: b\n").unwrap();

    let config =
        config_from_dirs(&[a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();

    assert_eq!(
        config.meta_data.unwrap().hostname.as_deref(),
        Some("b")
    );
}

#[test]
fn earlier_layer_keys_survive_where_not_overridden() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(
        a.path().join("meta-data"),
        "local-hostname: a\ninstance-id: id-a\n",
    )
    .unwrap();
    fs::write(b.path().join("meta-data"), "local-hostname: b\n").unwrap();

    let config =
        config_from_dirs(&[a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();

    let md = config.meta_data.unwrap();
    assert_eq!(md.hostname.as_deref(), Some("b"));
    assert_eq!(md.instance_id.as_deref(), Some("id-a"));
}

#[test]
fn unknown_fields_survive_partial_override_across_layers() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(
        a.path().join("user-data"),
        "#cloud-config\nunsupported_field: blabla\nusers:\n- name: sepp\n",
    )
    .unwrap();
    fs::write(
        b.path().join("user-data"),
        "#cloud-config\nusers:\n- name: vreni\n",
    )
    .unwrap();

    let config =
        config_from_dirs(&[a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();

    let ud = config.user_data.unwrap();
    assert_eq!(ud.users.len(), 1);
    assert_eq!(ud.users[0].name, "vreni");

    let text = String::from_utf8(ud.marshal().unwrap()).unwrap();
    assert!(text.contains("unsupported_field: blabla"));
}

#[test]
fn absent_documents_stay_absent_through_layering() {
    let a = tempdir().unwrap();
    fs::write(
        a.path().join("user-data"),
        "#cloud-config\nusers:\n- name: admin\n",
    )
    .unwrap();

    let config = config_from_dirs(&[a.path().to_path_buf()]).unwrap();

    assert!(config.user_data.is_some());
    assert!(config.meta_data.is_none());
    assert!(config.network_config.is_none());
}

#[test]
fn generated_defaults_apply_as_highest_precedence_overlay() {
    let a = tempdir().unwrap();
    fs::write(
        a.path().join("meta-data"),
        "local-hostname: from-profile\nextra-key: kept\n",
    )
    .unwrap();

    let mut config = config_from_dirs(&[a.path().to_path_buf()]).unwrap();
    let generated = default_config("web-1", "admin", "ssh-ed25519 AAAA", None);
    config.merge(&generated).unwrap();

    let md = config.meta_data.unwrap();
    assert_eq!(md.hostname.as_deref(), Some("web-1"));

    // The profile's unknown field is still carried.
    let text = String::from_utf8(md.marshal().unwrap()).unwrap();
    assert!(text.contains("extra-key: kept"));

    // Defaults also contributed the user document.
    assert_eq!(config.user_data.unwrap().users[0].name, "admin");
}

#[test]
fn missing_directory_fails_loudly() {
    let missing = PathBuf::from("/definitely/not/here");
    assert!(config_from_dirs(&[missing]).is_err());
}
