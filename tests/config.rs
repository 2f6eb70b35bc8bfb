// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, role defaults, discovery, and destination merging.

use cutover::config::*;
use cutover::error::Error;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
service: myapp
image: registry.example.com/myapp
servers:
  - app1.example.com
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.service.as_str(), "myapp");
        assert_eq!(config.image.as_str(), "registry.example.com/myapp");
        assert_eq!(config.primary_role, "web");
        assert_eq!(config.run_directory, ".cutover");
        assert_eq!(config.ssh.user, "root");
        assert_eq!(config.proxy.container, "cutover-proxy");

        let hosts = config.hosts().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].role, "web");
        assert_eq!(hosts[0].address.host(), "app1.example.com");
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
service: myapp
image: ghcr.io/org/app

servers:
  web:
    hosts:
      - web1.example.com
      - deploy@web2.example.com:2222
    port: 8080
    labels:
      team: platform
  workers:
    hosts: [jobs.example.com]
    cmd: bin/jobs
    env:
      clear:
        QUEUES: default
  assets:
    hosts: [cdn.example.com]
    proxy: true
    assets: /app/public/assets

env:
  clear:
    RAILS_ENV: production
  secret:
    - DATABASE_URL

healthcheck:
  path: /health
  interval: 2s
  max_attempts: 10
  readiness_delay: 3s

boot:
  limit: 25%

ssh:
  user: deploy
  port: 2200
  command_timeout: 1m
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.healthcheck.path, "/health");
        assert_eq!(config.healthcheck.interval, Duration::from_secs(2));
        assert_eq!(config.healthcheck.max_attempts, 10);
        assert_eq!(config.healthcheck.readiness_delay, Duration::from_secs(3));
        assert_eq!(config.boot.concurrency(8), 2);
        assert_eq!(config.ssh.command_timeout, Duration::from_secs(60));

        let roles = config.roles().unwrap();
        assert_eq!(roles[0].name, "web", "primary role comes first");

        let web = config.role("web").unwrap();
        assert_eq!(web.port, 8080);
        assert!(web.primary && web.healthcheck && web.cord);
        assert_eq!(web.labels["team"], "platform");
        assert_eq!(web.env.secret, vec!["DATABASE_URL"]);

        let workers = config.role("workers").unwrap();
        assert!(!workers.healthcheck && !workers.cord);
        assert_eq!(workers.env.clear["QUEUES"], "default");
        assert_eq!(workers.env.clear["RAILS_ENV"], "production");

        let assets = config.role("assets").unwrap();
        assert!(assets.proxy && assets.healthcheck && !assets.cord);
        assert!(assets.exposes_assets());

        let hosts = config.hosts().unwrap();
        assert_eq!(hosts.len(), 4);
        let web2 = &hosts[1].address;
        assert_eq!(web2.user(), Some("deploy"));
        let session = config.ssh.session_config(web2);
        assert_eq!(session.user, "deploy");
        assert_eq!(session.port, 2222);
        assert_eq!(config.ssh.session_config(&hosts[0].address).port, 2200);
    }

    #[test]
    fn flat_env_is_all_clear() {
        let yaml = r#"
service: myapp
image: myapp
servers: [1.1.1.1]
env:
  LOG_LEVEL: info
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.env.clear["LOG_LEVEL"], "info");
        assert!(config.env.secret.is_empty());
    }

    #[test]
    fn missing_service_returns_error() {
        let yaml = "image: myapp\nservers: [1.1.1.1]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_service_name_returns_error() {
        let yaml = "service: My App\nimage: myapp\nservers: [1.1.1.1]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn empty_servers_returns_error() {
        let yaml = "service: myapp\nimage: myapp\nservers: []\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn missing_primary_role_returns_error() {
        let yaml = r#"
service: myapp
image: myapp
servers:
  workers: [1.1.1.1]
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(message) if message.contains("primary role web")));
    }

    #[test]
    fn custom_primary_role() {
        let yaml = r#"
service: myapp
image: myapp
primary_role: api
servers:
  api: [1.1.1.1]
  workers: [2.2.2.2]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.role("api").unwrap().primary);
        assert!(!config.role("workers").unwrap().primary);
    }

    #[test]
    fn cord_without_healthcheck_is_rejected() {
        let yaml = r#"
service: myapp
image: myapp
servers:
  web: [1.1.1.1]
  workers:
    hosts: [2.2.2.2]
    cord: true
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("cord requires the health check"));
    }

    #[test]
    fn zero_boot_limit_is_rejected() {
        let yaml = "service: myapp\nimage: myapp\nservers: [1.1.1.1]\nboot:\n  limit: 0\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}

mod boot_limit {
    use super::*;

    fn limit(value: &str) -> BootConfig {
        let yaml = format!("service: myapp\nimage: myapp\nservers: [1.1.1.1]\nboot:\n  limit: {value}\n");
        Config::from_yaml(&yaml).unwrap().boot
    }

    #[test]
    fn unlimited_by_default() {
        assert_eq!(BootConfig::default().concurrency(5), 5);
    }

    #[test]
    fn host_count_is_capped_by_total() {
        assert_eq!(limit("2").concurrency(5), 2);
        assert_eq!(limit("10").concurrency(3), 3);
    }

    #[test]
    fn percentage_never_drops_to_zero() {
        assert_eq!(limit("\"50%\"").concurrency(4), 2);
        assert_eq!(limit("10%").concurrency(3), 1);
    }
}

mod discovery {
    use super::*;
    use std::fs;

    const MINIMAL: &str = "service: myapp\nimage: myapp\nservers: [1.1.1.1]\n";

    #[test]
    fn finds_cutover_yml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap().service.as_str(), "myapp");
    }

    #[test]
    fn finds_config_in_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".cutover")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), MINIMAL).unwrap();
        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn init_writes_a_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_config(dir.path(), Some("shop"), Some("acme/shop"), false).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.service.as_str(), "shop");
        assert_eq!(config.image.as_str(), "acme/shop");

        assert!(matches!(
            init_config(dir.path(), None, None, false),
            Err(Error::AlreadyExists(_))
        ));
        assert!(init_config(dir.path(), None, None, true).is_ok());
    }
}

mod destinations {
    use super::*;

    const YAML: &str = r#"
service: myapp
image: myapp
servers:
  web: [prod1.example.com, prod2.example.com]
env:
  clear:
    RAILS_ENV: production
  secret: [DATABASE_URL]
labels:
  owner: ops
destinations:
  staging:
    servers:
      web: [staging.example.com]
    env:
      clear:
        RAILS_ENV: staging
      secret: [STAGING_TOKEN]
    labels:
      tier: staging
    healthcheck:
      max_attempts: 3
"#;

    #[test]
    fn destination_overrides_servers() {
        let config = Config::from_yaml(YAML).unwrap().for_destination("staging").unwrap();
        assert_eq!(config.destination.as_deref(), Some("staging"));

        let hosts = config.hosts().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].address.host(), "staging.example.com");
    }

    #[test]
    fn destination_merges_env_and_labels() {
        let config = Config::from_yaml(YAML).unwrap().for_destination("staging").unwrap();

        assert_eq!(config.env.clear["RAILS_ENV"], "staging");
        assert_eq!(config.env.secret, vec!["DATABASE_URL", "STAGING_TOKEN"]);
        assert_eq!(config.labels["owner"], "ops");
        assert_eq!(config.labels["tier"], "staging");
        assert_eq!(config.healthcheck.max_attempts, 3);
    }

    #[test]
    fn base_config_is_untouched() {
        let base = Config::from_yaml(YAML).unwrap();
        let _ = base.for_destination("staging").unwrap();
        assert_eq!(base.destination, None);
        assert_eq!(base.hosts().unwrap().len(), 2);
    }

    #[test]
    fn unknown_destination_returns_error() {
        let err = Config::from_yaml(YAML).unwrap().for_destination("qa").unwrap_err();
        assert!(matches!(err, Error::UnknownDestination(name) if name == "qa"));
    }
}
