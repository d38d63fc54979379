use crate::common::{Assertable, TestRepo, MAIN_BRANCH};
use anyhow::anyhow;
use insta_cmd::get_cargo_bin;
use rstest::fixture;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use versionaire::config::ConfigurationFile;
use versionaire::GitVersion;

#[fixture]
pub fn cmd() -> Command {
    Command::new(get_cargo_bin(env!("CARGO_PKG_NAME")))
}

#[fixture]
pub fn repo(#[default(MAIN_BRANCH)] main: &str, mut cmd: Command) -> ConfiguredTestRepo {
    let repo = TestRepo::initialize(main);
    repo.commit("initial commit");
    cmd.current_dir(repo.path());

    ConfiguredTestRepo { inner: repo, config_file: ConfigurationFile::default(), cli: cmd }
}

pub struct ConfiguredTestRepo {
    pub inner: TestRepo,
    pub config_file: ConfigurationFile,
    pub cli: Command,
}

impl ConfiguredTestRepo {
    pub fn write_config(&self, name: &str, extension: &str) -> anyhow::Result<PathBuf> {
        let content = match extension {
            "toml" => toml::to_string(&self.config_file)?,
            "yaml" => serde_yaml::to_string(&self.config_file)?,
            other => return Err(anyhow!("Unsupported file extension {other}")),
        };
        let file_path = self.inner.path().join(format!("{name}.{extension}"));
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn assert<'a, I: IntoIterator<Item = &'a str>>(
        &mut self,
        args: I,
        config_file: Option<(&str, &str)>,
    ) -> Assertable {
        let config_path = match config_file {
            None => PathBuf::new(),
            Some((name, ext)) => self.write_config(name, ext).unwrap(),
        };
        if !config_path.as_os_str().is_empty() {
            self.cli.args(["--config", config_path.to_str().unwrap()]);
        }

        let output = self.cli.args(args).env_clear().output().unwrap();
        assert!(output.status.success(), "CLI exited non-zero: {}", String::from_utf8_lossy(&output.stderr));

        let stdout = str::from_utf8(&output.stdout).unwrap();
        let result: GitVersion = serde_json::from_str(stdout)
            .unwrap_or_else(|e| panic!("failed to parse CLI stdout as GitVersion: {e}\nstdout: {stdout}"));
        let context = format!("Git Graph:\n  {}", self.inner.graph());
        Assertable { result, context }
    }
}
