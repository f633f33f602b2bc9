use tp_domain::config::{Config, Persona};

#[test]
fn default_hosts_are_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.bridge.host, "127.0.0.1");
}

#[test]
fn default_ports_do_not_collide() {
    let config = Config::default();
    assert_ne!(config.server.port, config.bridge.port);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn default_persona_is_trendpup() {
    let config = Config::default();
    assert_eq!(config.personas, vec![Persona::named("TrendPup")]);
}

#[test]
fn empty_file_yields_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.bridge.port, 8080);
    assert_eq!(config.bridge.ping_interval_secs, 30);
    assert_eq!(config.personas.len(), 1);
}

#[test]
fn personas_parse_in_order() {
    let toml_str = r#"
[[personas]]
name = "InjectiveAssistant"
id = "inj-assistant"

[[personas]]
name = "TrendPup"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.personas.len(), 2);
    assert_eq!(config.personas[0].agent_id(), "inj-assistant");
    assert_eq!(config.personas[1].agent_id(), "TrendPup");
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 4100

[bridge]
port = 8090
ping_interval_secs = 10
max_payload_bytes = 65536
greeting = "hello"

[backend]
base_url = "http://agent.internal:3000"
timeout_secs = 30

[market]
analysis_path = "/srv/data/analysis.json"
helix_path = "/srv/data/helix.json"

[observability]
otlp_endpoint = "http://localhost:4317"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 4100);
    assert_eq!(config.bridge.max_payload_bytes, 65536);
    assert_eq!(config.bridge.greeting, "hello");
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.market.helix_path.to_str(), Some("/srv/data/helix.json"));
    assert!(config.validate().is_empty());
}
