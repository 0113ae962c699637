//! End-to-end tests: directive file in, adapted servers out.

use edge_config::config::{adapt, adapt_str, ConfigError};
use edge_config::modules::{ModuleRegistry, LISTENER_WRAPPER_KEY};
use edge_config::options::LEGACY_HTTP3_WARNING;
use edge_config::values::{Duration, TriState};

mod common;

const FULL: &str = r#"
{
    servers 10.0.0.1:443 {
        listener_wrappers {
            proxy_protocol {
                timeout 2s
                allow 10.0.0.0/8
            }
            tls
        }
        timeouts {
            read_body 10s
            read_header 5s
            write 30s
            idle 2m
        }
        max_header_size 1MB
        protocol {
            allow_h2c
            strict_sni_host
        }
    }
    servers {
        protocol {
            experimental_http3
        }
    }
}

example.com {
    respond "hello"
}
"#;

#[test]
fn test_scoped_and_fallback_entries() {
    let adapted = common::adapt_with(
        FULL,
        common::manifest(&[("public", &["10.0.0.1:443"]), ("plain", &[":80"])]),
    );

    let public = &adapted.servers["public"];
    assert_eq!(public.read_timeout, Duration::from_secs(10));
    assert_eq!(public.read_header_timeout, Duration::from_secs(5));
    assert_eq!(public.write_timeout, Duration::from_secs(30));
    assert_eq!(public.idle_timeout, Duration::from_secs(120));
    assert_eq!(public.max_header_bytes, 1_000_000);
    assert!(public.allow_h2c);
    assert!(!public.experimental_http3);
    assert_eq!(public.strict_sni_host, TriState::True);
    assert_eq!(public.listener_wrappers_raw.len(), 2);

    let plain = &adapted.servers["plain"];
    assert!(plain.experimental_http3);
    assert!(!plain.allow_h2c);
    assert!(plain.listener_wrappers_raw.is_empty());

    assert!(adapted.warnings.is_empty());
}

#[test]
fn test_adapted_json_output() {
    let adapted = common::adapt_with(FULL, common::manifest(&[("public", &["10.0.0.1:443"])]));
    let json = serde_json::to_value(&adapted).unwrap();

    let wrappers = &json["servers"]["public"]["listener_wrappers"];
    assert_eq!(wrappers[0][LISTENER_WRAPPER_KEY], "proxy_protocol");
    assert_eq!(wrappers[0]["allow"][0], "10.0.0.0/8");
    assert_eq!(wrappers[1], serde_json::json!({"wrapper": "tls"}));
    assert_eq!(json["servers"]["public"]["strict_sni_host"], true);
    assert_eq!(json["warnings"], serde_json::json!([]));
}

#[test]
fn test_wrappers_provision_from_adapted_servers() {
    let registry = ModuleRegistry::with_standard_modules();
    let adapted = common::adapt_with(FULL, common::manifest(&[("public", &["10.0.0.1:443"])]));
    let wrappers = adapted.servers["public"]
        .provision_listener_wrappers(&registry)
        .unwrap();
    assert_eq!(wrappers.len(), 2);
}

#[test]
fn test_earlier_unscoped_entry_wins() {
    let adapted = common::adapt_with(
        "{\n  servers {\n    protocol {\n      allow_h2c\n    }\n  }\n  servers :443 {\n    protocol {\n      experimental_http3\n    }\n  }\n}",
        common::manifest(&[("srv0", &[":443"])]),
    );
    let server = &adapted.servers["srv0"];
    assert!(server.allow_h2c);
    assert!(!server.experimental_http3);

    assert_eq!(adapted.warnings.len(), 1);
    assert_eq!(adapted.warnings[0].line, Some(7));
}

#[test]
fn test_unmatched_server_keeps_manifest_settings() {
    let manifest: edge_config::ServersManifest = toml::from_str(
        "[servers.internal]\nlisten = [\":8080\"]\nread_header_timeout = \"3s\"\nmax_header_bytes = 2048\n",
    )
    .unwrap();
    let adapted = common::adapt_with(
        "{\n  servers :443 {\n    timeouts {\n      read_header 5s\n    }\n  }\n}",
        manifest,
    );
    let server = &adapted.servers["internal"];
    assert_eq!(server.read_header_timeout, Duration::from_secs(3));
    assert_eq!(server.max_header_bytes, 2048);
}

#[test]
fn test_matched_server_loses_manifest_settings() {
    let manifest: edge_config::ServersManifest = toml::from_str(
        "[servers.edge]\nlisten = [\":443\"]\nmax_header_bytes = 2048\nstrict_sni_host = false\n",
    )
    .unwrap();
    let adapted = common::adapt_with(
        "{\n  servers {\n    timeouts {\n      idle 1m\n    }\n  }\n}",
        manifest,
    );
    let server = &adapted.servers["edge"];
    assert_eq!(server.idle_timeout, Duration::from_secs(60));
    assert_eq!(server.max_header_bytes, 0);
    assert!(server.strict_sni_host.is_unset());
}

#[test]
fn test_legacy_http3_flag() {
    let adapted = common::adapt_with(
        "{\n  experimental_http3\n}",
        common::manifest(&[("a", &[":80"]), ("b", &[":443"])]),
    );
    assert!(adapted.servers.values().all(|s| s.experimental_http3));
    assert_eq!(adapted.warnings.len(), 1);
    assert_eq!(adapted.warnings[0].message, LEGACY_HTTP3_WARNING);
}

#[test]
fn test_fatal_errors_carry_locations() {
    let registry = ModuleRegistry::with_standard_modules();
    let cases = [
        ("{\n  servers {\n    timeouts {\n      read_header\n    }\n  }\n}", 4),
        ("{\n  servers {\n    protocol {\n      bogus_flag\n    }\n  }\n}", 4),
        ("{\n  servers {\n    listener_wrappers {\n      nonexistent\n    }\n  }\n}", 4),
        ("{\n  servers {\n    max_header_size huge\n  }\n}", 3),
        ("{\n  servers :80 :443\n}", 2),
    ];

    for (input, line) in cases {
        let err = adapt_str(input, "Edgefile", common::manifest(&[]), &registry).unwrap_err();
        match err {
            ConfigError::Directive(e) => assert_eq!(e.location().line, line, "{input}"),
            other => panic!("unexpected error for {input:?}: {other}"),
        }
    }
}

#[test]
fn test_adapt_from_disk_with_default_servers() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::write_file(
        dir.path(),
        "Edgefile",
        "{\n  servers :80 {\n    protocol {\n      allow_h2c\n    }\n  }\n}\n",
    );

    let adapted = adapt(&config, None, &ModuleRegistry::with_standard_modules()).unwrap();
    assert!(adapted.servers["srv1"].allow_h2c);
    assert!(!adapted.servers["srv0"].allow_h2c);
}

#[test]
fn test_other_global_options_do_not_block_loading() {
    let adapted = common::adapt_with(
        "{\n  debug\n  admin off\n  servers {\n    protocol {\n      allow_h2c\n    }\n  }\n}",
        common::manifest(&[("srv0", &[":443"])]),
    );
    assert!(adapted.servers["srv0"].allow_h2c);
    assert_eq!(adapted.warnings.len(), 2);
    assert_eq!(adapted.warnings[1].line, Some(3));
}
