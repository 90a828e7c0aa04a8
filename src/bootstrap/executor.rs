//! The bootstrap state machine.

use std::path::Path;

use crate::bootstrap::{
    hba, is_initialized, sql, BootstrapError, BootstrapOutcome, BootstrapState,
};
use crate::config::env::{EnvResolver, EnvSource};
use crate::config::schema::{EntrypointSettings, ResolvedConfig, ADMIN_ACCOUNT, ADMIN_DATABASE};
use crate::config::{engine_env, resolve};
use crate::tools::{check, CommandRunner, Invocation};

/// Drives the external engine through the one-time setup sequence.
pub struct BootstrapExecutor<'a, R> {
    settings: &'a EntrypointSettings,
    runner: &'a R,
    state: BootstrapState,
}

impl<'a, R: CommandRunner> BootstrapExecutor<'a, R> {
    pub fn new(settings: &'a EntrypointSettings, runner: &'a R) -> Self {
        Self {
            settings,
            runner,
            state: BootstrapState::NotBootstrapped,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Run the sequence unless the data directory is already initialized.
    ///
    /// Configuration is resolved from `env` only when the sequence runs.
    pub async fn run<S: EnvSource>(
        &mut self,
        env: &mut EnvResolver<S>,
    ) -> Result<BootstrapOutcome, BootstrapError> {
        let data_dir = self.settings.require_data_dir()?.to_path_buf();

        if is_initialized(&data_dir) {
            tracing::info!(
                data_dir = %data_dir.display(),
                "database already created, skipping setup"
            );
            self.state = BootstrapState::Bootstrapped;
            return Ok(BootstrapOutcome::Skipped);
        }

        self.prepare_data_dir(&data_dir).await?;
        let config = resolve(env)?;
        let tool_env = engine_env(self.settings, env)?;

        self.transition(BootstrapState::Initializing);
        self.initialize(&config, &tool_env).await?;
        let trusted = config.trusted_accounts();
        let trust_enabled = hba::append_rules(&data_dir, &trusted)
            .await
            .map_err(|source| BootstrapError::Io {
                context: format!("cannot update {}", data_dir.join(hba::HBA_FILE).display()),
                source,
            })?;
        if trust_enabled {
            hba::print_trust_warning();
        }

        self.transition(BootstrapState::ServerWarmingUp);
        self.start_server(&data_dir, &tool_env).await?;

        self.transition(BootstrapState::Configuring);
        self.configure(&config, &tool_env).await?;

        self.transition(BootstrapState::ServerCoolingDown);
        self.stop_server(&data_dir, &tool_env).await?;

        self.transition(BootstrapState::Bootstrapped);
        tracing::info!("PostgreSQL init process complete; ready for start up.");

        Ok(BootstrapOutcome::Completed { trust_enabled })
    }

    fn transition(&mut self, next: BootstrapState) {
        tracing::debug!(from = ?self.state, to = ?next, "Bootstrap state change");
        self.state = next;
    }

    async fn prepare_data_dir(&self, data_dir: &Path) -> Result<(), BootstrapError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|source| BootstrapError::Io {
                context: format!("cannot create {}", data_dir.display()),
                source,
            })?;

        // Not running as root here, so ownership changes may be refused.
        let dir = data_dir.display().to_string();
        let tools = &self.settings.tools;
        let fixups = [
            Invocation::new(&tools.chown).args([
                "-R",
                self.settings.service_account.as_str(),
                dir.as_str(),
            ]),
            Invocation::new(&tools.chmod).args(["700", dir.as_str()]),
        ];
        for invocation in &fixups {
            if let Err(e) = check(self.runner, invocation).await {
                tracing::debug!(error = %e, "Ignoring permission fixup failure");
            }
        }
        Ok(())
    }

    async fn initialize(
        &self,
        config: &ResolvedConfig,
        tool_env: &[(String, String)],
    ) -> Result<(), BootstrapError> {
        let invocation = Invocation::new(&self.settings.tools.initdb)
            .arg(format!("--username={}", ADMIN_ACCOUNT))
            .args(config.init_args.iter().cloned())
            .envs(tool_env);
        check(self.runner, &invocation).await?;
        Ok(())
    }

    async fn start_server(
        &self,
        data_dir: &Path,
        tool_env: &[(String, String)],
    ) -> Result<(), BootstrapError> {
        let invocation = Invocation::new(&self.settings.tools.pg_ctl)
            .arg("-D")
            .arg(data_dir.display().to_string())
            .args(["-o", "-c listen_addresses='localhost'", "-w", "start"])
            .envs(tool_env);
        check(self.runner, &invocation).await?;
        Ok(())
    }

    async fn configure(
        &self,
        config: &ResolvedConfig,
        tool_env: &[(String, String)],
    ) -> Result<(), BootstrapError> {
        if let Some(password) = config.root_password.as_deref().filter(|pw| !pw.is_empty()) {
            tracing::info!(user = ADMIN_ACCOUNT, "Setting administrative password");
            self.psql(None, &sql::alter_admin_password(password), tool_env)
                .await?;
        }

        for user in &config.users {
            tracing::info!(user = %user.name, superuser = user.superuser, "Creating user");
            self.psql(None, &sql::create_user(user), tool_env).await?;
        }

        self.psql(Some(ADMIN_DATABASE), sql::REVOKE_PUBLIC_SCHEMA, tool_env)
            .await?;

        for database in &config.databases {
            tracing::info!(database = %database.name, owner = ?database.owner, "Creating database");
            self.psql(None, &sql::create_database(database), tool_env)
                .await?;
            self.psql(Some(&database.name), sql::REVOKE_PUBLIC_SCHEMA, tool_env)
                .await?;
            if let Some(owner) = &database.owner {
                self.psql(Some(&database.name), &sql::grant_public_schema(owner), tool_env)
                    .await?;
            }
        }

        for setting in &config.db_settings {
            tracing::info!(name = %setting.name, "Applying system setting");
            self.psql(None, &sql::alter_system(setting), tool_env)
                .await?;
        }

        Ok(())
    }

    async fn stop_server(
        &self,
        data_dir: &Path,
        tool_env: &[(String, String)],
    ) -> Result<(), BootstrapError> {
        let invocation = Invocation::new(&self.settings.tools.pg_ctl)
            .arg("-D")
            .arg(data_dir.display().to_string())
            .args(["-m", "fast", "-w", "stop"])
            .envs(tool_env);
        check(self.runner, &invocation).await?;
        Ok(())
    }

    async fn psql(
        &self,
        database: Option<&str>,
        statement: &str,
        tool_env: &[(String, String)],
    ) -> Result<(), BootstrapError> {
        let mut invocation = Invocation::new(&self.settings.tools.psql)
            .args(["-v", "ON_ERROR_STOP=1", "--username", ADMIN_ACCOUNT]);
        if let Some(database) = database {
            invocation = invocation.arg("--dbname").arg(database);
        }
        let invocation = invocation.envs(tool_env).stdin(statement);
        check(self.runner, &invocation).await?;
        Ok(())
    }
}
