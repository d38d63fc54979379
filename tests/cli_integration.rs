mod cli;
mod common;

use cli::{repo, ConfiguredTestRepo};
use common::MAIN_BRANCH;
use rstest::rstest;
use versionaire::config::ConfigurationFile;

#[rstest]
fn default_json_output_describes_an_unreleased_mainline_commit(mut repo: ConfiguredTestRepo) {
    repo.assert([], None)
        .sem_ver("0.1.0")
        .branch_name(MAIN_BRANCH)
        .version_source_sha("")
        .commits_since_version_source(1);
}

#[rstest]
fn output_short_prints_the_bare_sem_ver(mut repo: ConfiguredTestRepo) {
    let output = repo.cli.args(["--output", "short"]).env_clear().output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0.1.0");
}

#[rstest]
fn show_config_prints_the_effective_branch_table(mut repo: ConfiguredTestRepo) {
    let output = repo.cli.arg("--show-config").env_clear().output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: ConfigurationFile = toml::from_str(&stdout).unwrap();
    assert!(parsed.branches.unwrap().contains_key("main"));
}

#[rstest]
fn config_file_overrides_the_main_branch_pattern(#[with("stem")] mut repo: ConfiguredTestRepo) {
    repo.config_file.main_branch = Some("^stem$".to_string());

    repo.assert([], Some((".git-versioner", "toml")))
        .branch_name("stem")
        .sem_ver("0.1.0");
}

#[rstest]
fn next_version_cli_flag_pins_the_exact_output(mut repo: ConfiguredTestRepo) {
    repo.assert(["--next-version", "2.5.0"], None).sem_ver("2.5.0");
}

#[rstest]
fn output_msbuild_prints_a_property_group(mut repo: ConfiguredTestRepo) {
    let output = repo.cli.args(["--output", "msbuild"]).env_clear().output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<PropertyGroup>"));
    assert!(stdout.contains("</PropertyGroup>"));
    assert!(stdout.contains("<Major>0</Major>"));
    assert!(stdout.contains("<Minor>1</Minor>"));
    assert!(stdout.contains("<Patch>0</Patch>"));
}
