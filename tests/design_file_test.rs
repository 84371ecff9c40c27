//! Designs and configurations loaded from files, generated end to end.

use std::fs;

use httpgen::design::Design;
use httpgen::{Config, Error, Generator};
use tempfile::TempDir;

const ACCOUNTS: &str = r#"
types:
  Account:
    type:
      object:
        - name: id
          type: {primitive: int}
        - name: "display_name:name"
          type: {primitive: string}
          validation: {min_length: 1, max_length: 64}
        - name: email
          type: {primitive: string}
          validation: {format: email}
    validation:
      required: [id, display_name]
  NotFound:
    type:
      object:
        - name: message
          type: {primitive: string}
services:
  - name: accounts
    base_path: /accounts
    actions:
      - name: show
        routes:
          - {method: get, path: "/{id}"}
        payload:
          type:
            object:
              - name: id
                type: {primitive: int}
              - name: verbose
                type: {primitive: boolean}
                default: false
          validation:
            required: [id]
        params:
          type:
            object:
              - name: id
                type: {primitive: int}
              - name: verbose
                type: {primitive: boolean}
                default: false
          validation:
            required: [id]
        result:
          type: {user: Account}
        responses:
          - status: 200
        errors:
          - name: not_found
            attribute:
              type: {user: NotFound}
            response:
              status: 404
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_generate_from_yaml_design() {
    let dir = TempDir::new().unwrap();
    let design = Design::from_file(write(&dir, "accounts.yaml", ACCOUNTS)).unwrap();

    let generator = Generator::new(Config::default()).unwrap();
    let artifacts = generator.generate(&design).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].path, "transport/http/accounts_server.rs");

    let content = &artifacts[0].content;
    assert!(content.contains("pub fn mount_show_accounts_handler(mux: &mut rt::Muxer, handler: rt::Handler) {"));
    assert!(content.contains("mux.handle(\"GET\", \"/accounts/{id}\", handler.clone());"));
    assert!(content.contains("req.query_param(\"verbose\")"));
    assert!(content.contains("None => false,"));
    assert!(content.contains("pub fn encode_show_accounts_response(t: &service::Account)"));
    assert!(content.contains("pub fn encode_show_accounts_error(err: &rt::Error) -> rt::Response {"));
}

#[test]
fn test_design_round_trips_through_json() {
    let design = Design::from_yaml_str(ACCOUNTS).unwrap();
    let json = serde_json::to_string(&design).unwrap();
    assert_eq!(Design::from_json_str(&json).unwrap(), design);
}

#[test]
fn test_generate_with_config_file() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_file(write(
        &dir,
        "httpgen.toml",
        "runtime_module = \"crate::runtime\"\noutput_dir = \"src/http/\"\n",
    ))
    .unwrap();
    assert_eq!(config.service_module, "service");

    let design = Design::from_yaml_str(ACCOUNTS).unwrap();
    let artifacts = Generator::new(config).unwrap().generate(&design).unwrap();
    assert_eq!(artifacts[0].path, "src/http/accounts_server.rs");
    assert!(artifacts[0].content.contains("crate::runtime::StatusCode::OK"));
}

#[test]
fn test_unknown_user_type_fails_generation() {
    let design = Design::from_yaml_str(
        r#"
services:
  - name: accounts
    actions:
      - name: show
        routes:
          - {method: get, path: "/"}
        result:
          type: {user: Missing}
        responses:
          - status: 200
"#,
    )
    .unwrap();

    let err = Generator::new(Config::default())
        .unwrap()
        .generate(&design)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownUserType(name) if name == "Missing"));
}

#[test]
fn test_object_params_are_rejected() {
    let design = Design::from_yaml_str(
        r#"
services:
  - name: accounts
    actions:
      - name: search
        routes:
          - {method: get, path: "/"}
        payload:
          type:
            object:
              - name: filter
                type: {object: []}
        params:
          type:
            object:
              - name: filter
                type: {object: []}
        responses:
          - status: 204
"#,
    )
    .unwrap();

    let err = Generator::new(Config::default())
        .unwrap()
        .generate(&design)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));
}
