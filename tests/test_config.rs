mod common;

use common::ScratchDir;
use tinyweb::Config;
use tinyweb::config::{CONFIG_ENV, PORT_ENV};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.session_ttl_secs, 900);
    assert_eq!(cfg.worker_pool_size, 10);
    assert_eq!(cfg.read_timeout_ms, 2000);
    assert_eq!(cfg.static_prefix, "/web-content");
    assert!(cfg.static_root.is_none());
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_from_yaml_fills_missing_fields() {
    let cfg = Config::from_yaml_str("name: sample\nport: 2512\nsession_ttl_secs: 60\n").unwrap();

    assert_eq!(cfg.name, "sample");
    assert_eq!(cfg.port, 2512);
    assert_eq!(cfg.session_ttl_secs, 60);
    assert_eq!(cfg.worker_pool_size, 10);
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml_str("").unwrap();
    assert_eq!(cfg.port, Config::default().port);
}

#[test]
fn test_config_rejects_out_of_range_port() {
    assert!(Config::from_yaml_str("port: 70000").is_err());
}

#[test]
fn test_config_validation() {
    let mut cfg = Config::default();
    cfg.worker_pool_size = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.name = "  ".to_string();
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.static_prefix = "static".to_string();
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.static_root = Some("/definitely/not/here".into());
    assert!(cfg.validate().is_err());
}

#[test]
fn test_sweep_interval_never_exceeds_ttl() {
    let mut cfg = Config::default();
    cfg.session_ttl_secs = 5;
    assert_eq!(cfg.sweep_interval().as_secs(), 5);

    cfg.session_ttl_secs = 0;
    assert_eq!(cfg.sweep_interval().as_secs(), 1);
}

// The only test in this binary that touches the process environment.
#[test]
fn test_config_load_from_env() {
    let dir = ScratchDir::new("config");
    let file = dir.write("server.yaml", b"name: from-file\nport: 3000\n");

    unsafe {
        std::env::set_var(CONFIG_ENV, &file);
        std::env::remove_var(PORT_ENV);
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.name, "from-file");
    assert_eq!(cfg.port, 3000);

    unsafe {
        std::env::set_var(PORT_ENV, "5000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.port, 5000);

    unsafe {
        std::env::set_var(PORT_ENV, "not-a-port");
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var(CONFIG_ENV);
        std::env::remove_var(PORT_ENV);
    }
}
