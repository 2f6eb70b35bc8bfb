// ABOUTME: Commands for one role's app containers on a host.
// ABOUTME: Naming, lookup, run, status, stop, cord discovery, assets and env files.

use std::collections::BTreeMap;

use super::{container_id_named, docker};
use crate::config::{Config, Role};
use crate::cord::{CONTAINER_CORD_PATH, Cord};
use crate::shell::{
    Command, Opt, Redaction, ShellError, Value, argumentize, env_file_with_secrets, escape_shell_value,
    optionize, sensitive, single_quote,
};
use crate::types::Version;

/// Docker template printing the health status, or the plain state for
/// containers without a health check.
const STATUS_FORMAT: &str =
    "'{{if .State.Health}}{{.State.Health.Status}}{{else}}{{.State.Status}}{{end}}'";

/// The container currently running for a role, as captured before a boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub name: String,
    /// Value of the `version` label.
    pub version: String,
}

impl RunningContainer {
    /// Parse `<name> <version>` as printed by [`App::current_running_container`].
    /// Blank output means nothing is running.
    pub fn parse(output: &str) -> Option<Self> {
        let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
        let (name, version) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        Some(Self {
            name: name.to_string(),
            version: version.trim().to_string(),
        })
    }
}

/// Command builder for the app containers of one role at one version.
#[derive(Debug, Clone)]
pub struct App<'a> {
    config: &'a Config,
    role: &'a Role,
    version: &'a Version,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, role: &'a Role, version: &'a Version) -> Self {
        Self {
            config,
            role,
            version,
        }
    }

    pub fn service(&self) -> &str {
        self.config.service.as_str()
    }

    pub fn version(&self) -> &Version {
        self.version
    }

    /// `<service>-<role>[-<destination>]`, shared by every version's container.
    pub fn container_prefix(&self) -> String {
        let mut prefix = format!("{}-{}", self.config.service, self.role.name);
        if let Some(destination) = &self.config.destination {
            prefix.push('-');
            prefix.push_str(destination);
        }
        prefix
    }

    pub fn container_name(&self, version: &str) -> String {
        format!("{}-{}", self.container_prefix(), version)
    }

    /// Name of the container this boot starts.
    pub fn new_container_name(&self) -> String {
        self.container_name(self.version.as_str())
    }

    pub fn container_id_for_version(&self, version: &str) -> Command {
        container_id_named(&self.container_name(version))
    }

    pub fn rename_container(&self, version: &str, new_version: &str) -> Command {
        docker([
            "rename".to_string(),
            self.container_name(version),
            self.container_name(new_version),
        ])
    }

    /// Latest running container of this role, printed as `<name> <version>`.
    pub fn current_running_container(&self) -> Command {
        docker(["ps", "--latest"])
            .args(self.filter_args())
            .args([
                "--filter",
                "status=running",
                "--filter",
                "status=restarting",
                "--format",
                r#"'{{.Names}} {{.Label "version"}}'"#,
            ])
    }

    fn filter_args(&self) -> Vec<Value> {
        self.identity_labels()
            .into_iter()
            .flat_map(|(key, value)| ["--filter".into(), Value::Text(format!("label={key}={value}"))])
            .collect()
    }

    fn identity_labels(&self) -> Vec<(&'static str, String)> {
        let mut labels = vec![
            ("service", self.config.service.to_string()),
            ("role", self.role.name.clone()),
        ];
        if let Some(destination) = &self.config.destination {
            labels.push(("destination", destination.clone()));
        }
        labels
    }

    /// Start the new container detached.
    ///
    /// With a cord the health command also requires the cord file, and the
    /// cord directory is mounted into the container.
    pub fn run(&self, hostname: &str, cord: Option<&Cord>) -> Command {
        let name = self.new_container_name();

        let mut command = docker(["run", "--detach", "--restart", "unless-stopped"])
            .args(["--name".to_string(), name.clone()])
            .args(["--hostname", hostname])
            .args(argumentize(
                "-e",
                [
                    ("CUTOVER_CONTAINER_NAME", name.as_str()),
                    ("CUTOVER_VERSION", self.version.as_str()),
                ],
                Redaction::Clear,
            ))
            .args(["--env-file".to_string(), self.env_file_path()]);

        if self.role.healthcheck {
            let mut health_cmd = self.config.healthcheck.command_for(self.role.port);
            if cord.is_some() {
                health_cmd = format!("({health_cmd}) && {}", Cord::health_check());
            }
            let interval = format!("{}s", self.config.healthcheck.interval.as_secs().max(1));
            command = command.args(optionize(
                [
                    ("health-cmd", Opt::Value(health_cmd)),
                    ("health-interval", Opt::Value(interval)),
                ],
                None,
            ));
        }

        if let Some(cord) = cord {
            command = command.args(["--volume".to_string(), cord.volume()]);
        }

        if let Some(asset_path) = &self.role.assets {
            command = command.args([
                "--volume".to_string(),
                format!("{}:{}", self.asset_volume_path(self.version.as_str()), asset_path),
            ]);
        }

        command = command
            .args(argumentize("--label", self.labels(), Redaction::Clear))
            .args(optionize(&self.role.options, None))
            .arg(self.config.image.tagged(self.version));

        match &self.role.cmd {
            Some(cmd) => command.arg(cmd.as_str()),
            None => command,
        }
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.config.labels.clone();
        labels.extend(self.role.labels.clone());
        // Identity labels last: lookups of running containers depend on them.
        labels.extend(
            self.identity_labels()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        labels.insert("version".to_string(), self.version.to_string());
        labels
    }

    pub fn status(&self, container: &str) -> Command {
        container_id_named(container).pipe(
            Command::new(["xargs", "docker", "inspect", "--format"]).arg(STATUS_FORMAT),
        )
    }

    pub fn stop(&self, container: &str) -> Command {
        container_id_named(container).pipe(Command::new(["xargs", "docker", "stop"]))
    }

    /// Host directory of the cord mounted into `container`, if any.
    pub fn cord(&self, container: &str) -> Command {
        docker(["inspect", "-f"])
            .arg(r#"'{{ range .Mounts }}{{printf "%s %s\n" .Source .Destination}}{{ end }}'"#)
            .arg(container)
            .pipe(Command::new(["awk"]).arg(format!(
                "'$2 == \"{CONTAINER_CORD_PATH}\" {{print $1}}'"
            )))
    }

    fn assets_root(&self) -> String {
        format!("{}/assets", self.config.run_directory)
    }

    fn asset_extracted_path(&self, version: &str) -> String {
        format!("{}/extracted/{}", self.assets_root(), self.container_name(version))
    }

    fn asset_volume_path(&self, version: &str) -> String {
        format!("{}/volumes/{}", self.assets_root(), self.container_name(version))
    }

    /// Copy the role's assets out of the new image, then merge them with
    /// the old version's so requests for either version's assets succeed
    /// during the cutover.
    ///
    /// Returns `None` for roles without assets.
    pub fn extract_assets(&self, old_version: Option<&str>) -> Option<Command> {
        let asset_path = self.role.assets.as_deref()?;
        let helper = format!("{}-assets", self.container_prefix());
        let extracted = self.asset_extracted_path(self.version.as_str());
        let volume = self.asset_volume_path(self.version.as_str());

        let mut command = Command::new(["mkdir", "-p", extracted.as_str()])
            .and(
                docker(["stop", "-t", "1", helper.as_str(), "2>", "/dev/null", "||", "true"]),
            )
            .and(docker(["run", "--name", helper.as_str(), "--detach", "--rm"]).args([
                self.config.image.tagged(self.version),
                "sleep".to_string(),
                "1000000".to_string(),
            ]))
            .and(docker([
                "cp".to_string(),
                "-L".to_string(),
                format!("{helper}:{asset_path}/."),
                extracted.clone(),
            ]))
            .and(docker(["stop", "-t", "1", helper.as_str()]))
            .and(Command::new(["mkdir", "-p", volume.as_str()]))
            .and(Command::new(["cp", "-rnT", extracted.as_str(), volume.as_str()]));

        if let Some(old) = old_version.filter(|old| *old != self.version.as_str()) {
            let old_extracted = self.asset_extracted_path(old);
            let old_volume = self.asset_volume_path(old);
            command = command
                .chain(
                    Command::new(["cp", "-rnT", extracted.as_str(), old_volume.as_str()])
                        .args(["||", "true"]),
                )
                .chain(
                    Command::new(["cp", "-rnT", old_extracted.as_str(), volume.as_str()])
                        .args(["||", "true"]),
                );
        }

        Some(command)
    }

    /// Remove asset directories of every other version of this role.
    pub fn clean_up_assets(&self) -> Option<Command> {
        if !self.role.exposes_assets() {
            return None;
        }
        let version = self.version.as_str();
        Some(
            self.remove_older_siblings(&format!("{}/extracted", self.assets_root()), version)
                .chain(
                    self.remove_older_siblings(&format!("{}/volumes", self.assets_root()), version),
                ),
        )
    }

    fn remove_older_siblings(&self, dir: &str, keep_version: &str) -> Command {
        Command::new(["find", dir, "-maxdepth", "1", "-name"])
            .arg(single_quote(&format!("{}-*", self.container_prefix())))
            .args(["!", "-name"])
            .arg(escape_shell_value(&self.container_name(keep_version)))
            .args(["-exec", "rm", "-rf", "\"{}\"", "+"])
    }

    /// `<run_directory>/env/roles/<service>-<role>[-<destination>].env`
    pub fn env_file_path(&self) -> String {
        format!(
            "{}/env/roles/{}.env",
            self.config.run_directory,
            self.container_prefix()
        )
    }

    /// Write the role's env file with secrets resolved from the local
    /// environment. The file contents never appear in logs.
    pub fn push_env_file(&self) -> Result<Command, ShellError> {
        let contents = env_file_with_secrets(&self.role.env)?;
        let path = self.env_file_path();
        let dir = format!("{}/env/roles", self.config.run_directory);

        Ok(Command::new(["mkdir", "-p", dir.as_str()])
            .and(
                Command::new(["printf", "'%s'"])
                    .arg(sensitive(single_quote(&contents), None))
                    .args([">", path.as_str()]),
            )
            .and(Command::new(["chmod", "600", path.as_str()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_yaml(
            r#"
service: app
image: dhh/app
servers:
  web:
    hosts: [1.1.1.1]
  workers:
    hosts: [1.1.1.3]
    cmd: bin/jobs
    options:
      memory: 512m
  assets:
    hosts: [1.1.1.4]
    assets: /app/public/assets
env:
  clear:
    RAILS_ENV: production
labels:
  team: platform
"#,
        )
        .unwrap()
    }

    fn version() -> Version {
        Version::new("123").unwrap()
    }

    #[test]
    fn container_names_include_destination() {
        let mut config = config();
        let role = config.role("web").unwrap();
        let version = version();
        assert_eq!(App::new(&config, &role, &version).new_container_name(), "app-web-123");

        config.destination = Some("staging".to_string());
        assert_eq!(
            App::new(&config, &role, &version).new_container_name(),
            "app-web-staging-123"
        );
    }

    #[test]
    fn container_id_and_rename() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        let app = App::new(&config, &role, &version);
        assert_eq!(
            app.container_id_for_version("123").to_shell(),
            "docker container ls --all --filter name=^app-web-123$ --quiet"
        );
        assert_eq!(
            app.rename_container("123", "123_replaced_abc").to_shell(),
            "docker rename app-web-123 app-web-123_replaced_abc"
        );
    }

    #[test]
    fn current_running_container_filters_by_labels() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        assert_eq!(
            App::new(&config, &role, &version)
                .current_running_container()
                .to_shell(),
            r#"docker ps --latest --filter label=service=app --filter label=role=web --filter status=running --filter status=restarting --format '{{.Names}} {{.Label "version"}}'"#
        );
    }

    #[test]
    fn run_with_cord_and_healthcheck() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        let app = App::new(&config, &role, &version);
        let cord = Cord::at(".cutover/cords/app-web-abc");

        assert_eq!(
            app.run("1.1.1.1-abcdef", Some(&cord)).to_shell(),
            "docker run --detach --restart unless-stopped --name app-web-123 --hostname 1.1.1.1-abcdef \
             -e CUTOVER_CONTAINER_NAME=\"app-web-123\" -e CUTOVER_VERSION=\"123\" \
             --env-file .cutover/env/roles/app-web.env \
             --health-cmd \"(curl -f http://localhost:3000/up || exit 1) && (cat /tmp/cutover-cord/cord > /dev/null || exit 1)\" \
             --health-interval \"1s\" \
             --volume .cutover/cords/app-web-abc:/tmp/cutover-cord \
             --label role=\"web\" --label service=\"app\" --label team=\"platform\" --label version=\"123\" \
             dhh/app:123"
        );
    }

    #[test]
    fn run_for_worker_role() {
        let config = config();
        let role = config.role("workers").unwrap();
        let version = version();
        let command = App::new(&config, &role, &version)
            .run("1.1.1.3-abcdef", None)
            .to_shell();
        assert!(!command.contains("--health-cmd"));
        assert!(command.ends_with("--memory \"512m\" dhh/app:123 bin/jobs"));
    }

    #[test]
    fn status_and_stop_address_containers_by_name() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        let app = App::new(&config, &role, &version);
        assert_eq!(
            app.status("app-web-123").to_shell(),
            "docker container ls --all --filter name=^app-web-123$ --quiet | xargs docker inspect --format '{{if .State.Health}}{{.State.Health.Status}}{{else}}{{.State.Status}}{{end}}'"
        );
        assert_eq!(
            app.stop("app-web-122").to_shell(),
            "docker container ls --all --filter name=^app-web-122$ --quiet | xargs docker stop"
        );
    }

    #[test]
    fn cord_reads_mounts() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        assert_eq!(
            App::new(&config, &role, &version).cord("app-web-122").to_shell(),
            r#"docker inspect -f '{{ range .Mounts }}{{printf "%s %s\n" .Source .Destination}}{{ end }}' app-web-122 | awk '$2 == "/tmp/cutover-cord" {print $1}'"#
        );
    }

    #[test]
    fn assets_only_for_roles_that_expose_them() {
        let config = config();
        let version = version();
        let web = config.role("web").unwrap();
        assert!(App::new(&config, &web, &version).extract_assets(None).is_none());
        assert!(App::new(&config, &web, &version).clean_up_assets().is_none());

        let role = config.role("assets").unwrap();
        let app = App::new(&config, &role, &version);
        let extract = app.extract_assets(Some("122")).unwrap().to_shell();
        assert!(extract.starts_with("mkdir -p .cutover/assets/extracted/app-assets-123 && "));
        assert!(extract.contains("docker cp -L app-assets-assets:/app/public/assets/. .cutover/assets/extracted/app-assets-123"));
        assert!(extract.ends_with(
            "cp -rnT .cutover/assets/extracted/app-assets-122 .cutover/assets/volumes/app-assets-123 || true"
        ));
        assert!(
            app.run("h", None)
                .to_shell()
                .contains("--volume .cutover/assets/volumes/app-assets-123:/app/public/assets")
        );

        assert_eq!(
            app.clean_up_assets().unwrap().to_shell(),
            "find .cutover/assets/extracted -maxdepth 1 -name 'app-assets-*' ! -name \"app-assets-123\" -exec rm -rf \"{}\" + ; \
             find .cutover/assets/volumes -maxdepth 1 -name 'app-assets-*' ! -name \"app-assets-123\" -exec rm -rf \"{}\" +"
        );
    }

    #[test]
    fn env_file_contents_are_redacted() {
        let config = config();
        let role = config.role("web").unwrap();
        let version = version();
        let command = App::new(&config, &role, &version).push_env_file().unwrap();
        assert_eq!(
            command.to_shell(),
            "mkdir -p .cutover/env/roles && printf '%s' 'RAILS_ENV=production\n' > .cutover/env/roles/app-web.env && chmod 600 .cutover/env/roles/app-web.env"
        );
        assert_eq!(
            command.redacted(),
            "mkdir -p .cutover/env/roles && printf '%s' [REDACTED] > .cutover/env/roles/app-web.env && chmod 600 .cutover/env/roles/app-web.env"
        );
    }

    #[test]
    fn parses_running_container() {
        assert_eq!(RunningContainer::parse(""), None);
        assert_eq!(RunningContainer::parse("  \n"), None);
        assert_eq!(
            RunningContainer::parse("app-web-122 122\n"),
            Some(RunningContainer {
                name: "app-web-122".to_string(),
                version: "122".to_string()
            })
        );
        assert_eq!(
            RunningContainer::parse("app-web-legacy"),
            Some(RunningContainer {
                name: "app-web-legacy".to_string(),
                version: String::new()
            })
        );
    }
}
