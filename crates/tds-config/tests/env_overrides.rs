use figment::Jail;
use tds_config::SyncConfig;

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "tdsync.toml",
            "[connection]\nwarehouse = \"WH_XS\"\ndbname = \"ANALYTICS\"\n",
        )?;
        jail.set_env("TDSYNC_CONNECTION__WAREHOUSE", "WH_L");

        let config = SyncConfig::load().expect("config loads");
        assert_eq!(config.connection.warehouse, "WH_L");
        assert_eq!(config.connection.dbname, "ANALYTICS");
        Ok(())
    });
}

#[test]
fn env_fills_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("TDSYNC_PLATFORM__ROOT", "/srv/platform");
        jail.set_env("TDSYNC_CONNECTION__CREDENTIALS__USERNAME", "svc");
        jail.set_env("TDSYNC_CONNECTION__CREDENTIALS__PASSWORD", "from-env");
        jail.set_env("TDSYNC_RUN__MAX_CONCURRENCY", "2");
        jail.set_env("TDSYNC_RUN__EXCLUDED", "[\"Orders\", \"Returns\"]");

        let config = SyncConfig::load().expect("config loads");
        assert!(config.platform.is_configured());
        assert_eq!(
            config.connection.credentials().map(|c| c.password),
            Some("from-env".to_string())
        );
        assert_eq!(config.run.max_concurrency, 2);
        assert_eq!(config.run.excluded, vec!["Orders", "Returns"]);
        Ok(())
    });
}

#[test]
fn dotenv_file_is_honored() {
    Jail::expect_with(|jail| {
        jail.create_file(".env", "TDSYNC_CONNECTION__SCHEMA=FROM_DOTENV\n")?;

        let config = SyncConfig::load_with_dotenv().expect("config loads");
        assert_eq!(config.connection.schema, "FROM_DOTENV");
        Ok(())
    });
}
