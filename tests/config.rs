use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use annofetch::config::{Config, ConfigLoader};
use annofetch::error::AnnofetchError;

#[test]
fn parse_config_overrides() {
    let config: Config = serde_json::from_str(
        r#"{
            "archive_url": "https://mirror.example.org/ensembl/pub",
            "output_dir": "data/ref",
            "mapping_dir": "maps",
            "connect_timeout_secs": 5
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve_config(config);
    assert_eq!(resolved.archive_url, "https://mirror.example.org/ensembl/pub");
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("data/ref"));
    assert_eq!(resolved.mapping_dir, Some(Utf8PathBuf::from("maps")));
    assert_eq!(resolved.connect_timeout, Duration::from_secs(5));
    assert_eq!(resolved.user_agent, None);
}

#[test]
fn explicit_config_file_is_read() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("annofetch.json");
    std::fs::write(&path, r#"{ "output_dir": "genomes" }"#).unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("genomes"));
    assert_eq!(resolved.source.as_deref(), Some(path.as_path()));
}

#[test]
fn missing_explicit_config_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nope.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, AnnofetchError::ConfigRead(_));
    assert!(err.is_configuration());
}

#[test]
fn malformed_config_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("annofetch.json");
    std::fs::write(&path, "{ output_dir: ").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, AnnofetchError::ConfigParse(_));
}
