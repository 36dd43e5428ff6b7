use std::io::Write;
use std::path::PathBuf;

use fadeframe::config::Configuration;

fn parse(yaml: &str) -> Configuration {
    serde_yaml::from_str::<Configuration>(yaml)
        .expect("configuration should parse")
        .validated()
        .expect("configuration should validate")
}

#[test]
fn empty_document_yields_defaults() {
    let config = parse("{}");
    assert_eq!(config.library_path, None);
    assert_eq!(config.startup_shuffle_seed, None);
    assert!(config.start_fullscreen);
}

#[test]
fn kebab_case_keys_parse() {
    let config = parse(
        r#"
library-path: /photos/frame
startup-shuffle-seed: 42
start-fullscreen: false
"#,
    );
    assert_eq!(config.library_path, Some(PathBuf::from("/photos/frame")));
    assert_eq!(config.startup_shuffle_seed, Some(42));
    assert!(!config.start_fullscreen);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>("transition-ms: 2000\n")
        .expect_err("unknown keys must fail");
    assert!(err.to_string().contains("transition-ms"), "{err}");
}

#[test]
fn empty_library_path_is_rejected() {
    let config: Configuration =
        serde_yaml::from_str("library-path: \"\"\n").expect("parse should succeed");
    assert!(config.validated().is_err());
}

#[test]
fn loads_from_a_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "library-path: /srv/pictures").expect("write");
    writeln!(file, "startup-shuffle-seed: 9").expect("write");

    let config = fadeframe::config::from_yaml_file(file.path()).expect("load");
    assert_eq!(config.library_path, Some(PathBuf::from("/srv/pictures")));
    assert_eq!(config.startup_shuffle_seed, Some(9));
    assert!(config.start_fullscreen);
}

#[test]
fn missing_file_reports_its_path() {
    let err = fadeframe::config::from_yaml_file(std::path::Path::new("/no/such/config.yaml"))
        .expect_err("missing file must fail");
    assert!(format!("{err:#}").contains("/no/such/config.yaml"));
}
