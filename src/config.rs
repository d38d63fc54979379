//! Configuration: CLI args, config file and built-in defaults, layered the
//! way the reference crate layers its own narrower configuration (spec §6,
//! §10.1-§10.2).

use crate::directives::CommitMessageIncrementing;
use crate::errors::{Result, VersionCalculationError};
use crate::semver_model::SemanticVersion;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAIN_BRANCH_REGEX: &str = r"^(trunk|main|master)$";
pub const RELEASE_BRANCH_REGEX: &str = r"^releases?[/-](?<BranchName>.+)$";
pub const FEATURE_BRANCH_REGEX: &str = r"^features?[/-](?<BranchName>.+)$";
pub const HOTFIX_BRANCH_REGEX: &str = r"^hotfix(es)?[/-](?<BranchName>.+)$";
pub const SUPPORT_BRANCH_REGEX: &str = r"^support[/-](?<BranchName>.+)$";
pub const PULL_REQUEST_BRANCH_REGEX: &str = r"^(pull|pull-requests|pr)[/-](?<BranchName>\d+)$";
pub const DEVELOP_BRANCH_REGEX: &str = r"^dev(elop)?$";
pub const TAG_PREFIX: &str = r"[vV]?";
pub const DEFAULT_PRE_RELEASE_TAG: &str = "pre";

/// A single named entry of the `branches` map (spec §3's `BranchConfig`
/// fields, as they appear on the configuration-file wire format). Every
/// field is optional: `None` means "inherit" for most fields, or "use the
/// crate default" for `regex`/`tag` when absent entirely (never the case
/// for a present entry, since `regex` is mandatory on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BranchConfigEntry {
    pub regex: String,
    pub tag: Option<String>,
    pub increment: Option<String>,
    pub versioning_mode: Option<String>,
    pub prevent_increment_of_merged_branch_version: Option<bool>,
    pub track_merge_target: Option<bool>,
    pub source_branches: Option<Vec<String>>,
    pub is_release_branch: Option<bool>,
    pub is_mainline: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IgnoreConfig {
    pub shas: Vec<String>,
    pub commits_before: Option<DateTime<Utc>>,
}

/// Fully-resolved configuration the rest of the pipeline consumes. Built by
/// layering CLI args over a config file over built-in defaults (spec §10.2).
#[derive(Debug, Clone)]
pub struct Configuration {
    pub repository_path: PathBuf,
    pub next_version: Option<SemanticVersion>,
    pub tag_prefix: String,
    pub current_branch_override: Option<String>,
    pub commit_message_incrementing: CommitMessageIncrementing,
    pub merge_message_formats: Vec<String>,
    pub ignore: IgnoreConfig,
    pub branches: BTreeMap<String, BranchConfigEntry>,
    pub verbose: bool,
    pub show_config: bool,
}

impl Configuration {
    /// The crate's built-in branch layout: trunk, release, feature, hotfix,
    /// support, develop and pull-request branches, matching the branch
    /// lifecycle classification named in spec §4.9.
    pub fn defaults() -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(
            "main".to_string(),
            BranchConfigEntry {
                regex: MAIN_BRANCH_REGEX.to_string(),
                tag: Some(String::new()),
                increment: Some("Minor".to_string()),
                versioning_mode: Some("ContinuousDeployment".to_string()),
                is_mainline: Some(true),
                source_branches: Some(vec![]),
                track_merge_target: Some(true),
                ..Default::default()
            },
        );
        branches.insert(
            "develop".to_string(),
            BranchConfigEntry {
                regex: DEVELOP_BRANCH_REGEX.to_string(),
                tag: Some("alpha".to_string()),
                increment: Some("Minor".to_string()),
                versioning_mode: Some("ContinuousDelivery".to_string()),
                source_branches: Some(vec!["main".to_string()]),
                track_merge_target: Some(true),
                ..Default::default()
            },
        );
        branches.insert(
            "release".to_string(),
            BranchConfigEntry {
                regex: RELEASE_BRANCH_REGEX.to_string(),
                tag: Some("beta".to_string()),
                increment: Some("Patch".to_string()),
                versioning_mode: Some("ContinuousDelivery".to_string()),
                is_release_branch: Some(true),
                prevent_increment_of_merged_branch_version: Some(true),
                source_branches: Some(vec!["main".to_string(), "develop".to_string()]),
                ..Default::default()
            },
        );
        branches.insert(
            "feature".to_string(),
            BranchConfigEntry {
                regex: FEATURE_BRANCH_REGEX.to_string(),
                tag: Some("useBranchName".to_string()),
                increment: Some("Inherit".to_string()),
                versioning_mode: Some("ContinuousDelivery".to_string()),
                source_branches: Some(vec!["main".to_string(), "develop".to_string()]),
                ..Default::default()
            },
        );
        branches.insert(
            "hotfix".to_string(),
            BranchConfigEntry {
                regex: HOTFIX_BRANCH_REGEX.to_string(),
                tag: Some("beta".to_string()),
                increment: Some("Patch".to_string()),
                versioning_mode: Some("ContinuousDelivery".to_string()),
                is_release_branch: Some(true),
                source_branches: Some(vec!["main".to_string()]),
                ..Default::default()
            },
        );
        branches.insert(
            "support".to_string(),
            BranchConfigEntry {
                regex: SUPPORT_BRANCH_REGEX.to_string(),
                tag: Some(String::new()),
                increment: Some("Patch".to_string()),
                versioning_mode: Some("ContinuousDeployment".to_string()),
                track_merge_target: Some(true),
                source_branches: Some(vec!["main".to_string()]),
                ..Default::default()
            },
        );
        branches.insert(
            "pull-request".to_string(),
            BranchConfigEntry {
                regex: PULL_REQUEST_BRANCH_REGEX.to_string(),
                tag: Some("PullRequest{BranchName}".to_string()),
                increment: Some("Inherit".to_string()),
                versioning_mode: Some("ContinuousDelivery".to_string()),
                source_branches: Some(vec!["main".to_string(), "develop".to_string()]),
                ..Default::default()
            },
        );

        Self {
            repository_path: ".".into(),
            next_version: None,
            tag_prefix: TAG_PREFIX.to_string(),
            current_branch_override: None,
            commit_message_incrementing: CommitMessageIncrementing::Disabled,
            merge_message_formats: vec![r"Merge branch '(?<BranchName>.+)'".to_string()],
            ignore: IgnoreConfig::default(),
            branches,
            verbose: false,
            show_config: false,
        }
    }
}

/// Raw, partially-populated config-file contents (spec §10.2). Every field
/// is optional; CLI args win over these, which win over
/// [`Configuration::defaults`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConfigurationFile {
    pub next_version: Option<String>,
    pub tag_prefix: Option<String>,
    pub current_branch: Option<String>,
    pub commit_message_incrementing: Option<String>,
    pub continuous_delivery: Option<bool>,
    pub merge_message_formats: Option<Vec<String>>,

    // Legacy fixed-name fields from the reference crate, kept for backward
    // compatibility with its existing config fixtures. When present, each
    // overrides the corresponding `regex` of the synthesized
    // trunk/release/feature entries in `branches`. Declared ahead of the
    // table-valued fields below: TOML requires every plain key of a table
    // to precede its nested `[table]` sections.
    pub main_branch: Option<String>,
    pub release_branch: Option<String>,
    pub feature_branch: Option<String>,
    pub version_pattern: Option<String>,
    pub pre_release_tag: Option<String>,

    pub ignore: Option<IgnoreConfig>,
    pub branches: Option<BTreeMap<String, BranchConfigEntry>>,
}

impl ConfigurationFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| anyhow::anyhow!("File has no extension"))?;

        match extension.to_lowercase().as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported file format: {}", extension)),
        }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn from_default_files() -> anyhow::Result<Self> {
        for candidate in [".git-versioner.toml", ".git-versioner.yaml", ".git-versioner.yml"] {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Err(anyhow::anyhow!("No configuration file found"))
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, value_parser)]
    pub path: Option<PathBuf>,

    #[arg(long, value_parser)]
    pub next_version: Option<String>,

    #[arg(long, value_parser)]
    pub tag_prefix: Option<String>,

    /// Overrides the current branch name; required on a detached HEAD.
    #[arg(long, value_parser)]
    pub current_branch: Option<String>,

    #[arg(long, value_parser)]
    pub commit_message_incrementing: Option<String>,

    /// Outputs effective configuration in TOML format
    #[arg(long)]
    pub show_config: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// `json`, `short`, `full` or `msbuild`
    #[arg(long, default_value = "json")]
    pub output: String,

    /// Path to a configuration file (TOML or YAML)
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,

    /// Default pre-release tag applied to develop/release/hotfix branches
    #[arg(long = "pre-release-tag", value_parser)]
    pub pre_release_tag: Option<String>,

    /// A commit sha to exclude from version calculation; repeatable
    #[arg(long = "ignore-sha", value_name = "SHA")]
    pub ignore_sha: Vec<String>,

    /// Exclude every commit strictly before this RFC3339 timestamp
    #[arg(long = "ignore-before")]
    pub ignore_before: Option<DateTime<Utc>>,
}

pub fn load_configuration() -> anyhow::Result<(Args, ConfigurationFile)> {
    let args = Args::parse();
    let file = match &args.config_file {
        None => ConfigurationFile::from_default_files(),
        Some(path) => ConfigurationFile::from_file(path),
    }
    .unwrap_or_default();
    Ok((args, file))
}

/// Folds CLI args and a config file over the built-in defaults into a
/// validated [`Configuration`]. Configuration errors (bad regex, malformed
/// `NextVersion`) are raised here, eagerly, per spec §7.
pub fn resolve(args: &Args, file: &ConfigurationFile) -> Result<Configuration> {
    let mut config = Configuration::defaults();

    config.repository_path =
        args.path.clone().unwrap_or_else(|| std::env::current_dir().unwrap_or(PathBuf::from(".")));
    config.verbose = args.verbose;
    config.show_config = args.show_config;
    config.current_branch_override = args.current_branch.clone().or_else(|| file.current_branch.clone());

    if let Some(prefix) = args.tag_prefix.clone().or_else(|| file.tag_prefix.clone()) {
        config.tag_prefix = prefix;
    }

    let next_version_str = args.next_version.clone().or_else(|| file.next_version.clone());
    if let Some(raw) = next_version_str {
        config.next_version = Some(
            SemanticVersion::parse(&raw)
                .map_err(|e| VersionCalculationError::Configuration(format!("NextVersion: {e}")))?,
        );
    }

    let incrementing_str =
        args.commit_message_incrementing.clone().or_else(|| file.commit_message_incrementing.clone());
    if let Some(raw) = incrementing_str {
        config.commit_message_incrementing =
            CommitMessageIncrementing::parse(&raw).map_err(VersionCalculationError::Configuration)?;
    }

    if let Some(formats) = &file.merge_message_formats {
        config.merge_message_formats = formats.clone();
    }
    if let Some(ignore) = &file.ignore {
        config.ignore = ignore.clone();
    }
    config.ignore.shas.extend(args.ignore_sha.clone());
    if let Some(cutoff) = args.ignore_before {
        config.ignore.commits_before = Some(cutoff);
    }

    apply_legacy_fields(&mut config, file);

    if let Some(tag) = args.pre_release_tag.clone() {
        for key in ["develop", "release", "hotfix"] {
            if let Some(entry) = config.branches.get_mut(key) {
                entry.tag = Some(tag.clone());
            }
        }
    }

    if let Some(branches) = &file.branches {
        for (name, entry) in branches {
            config.branches.insert(name.clone(), entry.clone());
        }
    }

    if let Some(true) = file.continuous_delivery {
        for entry in config.branches.values_mut() {
            if entry.is_mainline != Some(true) {
                entry.versioning_mode = Some("ContinuousDelivery".to_string());
            }
        }
    }

    for (name, entry) in &config.branches {
        if let Err(e) = regex::Regex::new(&entry.regex) {
            return Err(VersionCalculationError::Configuration(format!(
                "invalid regex for branch config {name:?}: {e}"
            )));
        }
    }

    Ok(config)
}

/// Synthesizes overrides for the legacy fixed-name fields into the
/// corresponding entries of the `branches` map (spec §11's backward
/// compatibility note).
fn apply_legacy_fields(config: &mut Configuration, file: &ConfigurationFile) {
    if let Some(regex) = &file.main_branch {
        config.branches.entry("main".to_string()).or_default().regex = regex.clone();
    }
    if let Some(regex) = &file.release_branch {
        config.branches.entry("release".to_string()).or_default().regex = regex.clone();
    }
    if let Some(regex) = &file.feature_branch {
        config.branches.entry("feature".to_string()).or_default().regex = regex.clone();
    }
    if let Some(tag) = &file.pre_release_tag {
        for key in ["develop", "release", "hotfix"] {
            if let Some(entry) = config.branches.get_mut(key) {
                entry.tag = Some(tag.clone());
            }
        }
    }
}

/// Unconfigured ancestors to ignore entirely (spec §6's `ignore` config):
/// a sha set plus an optional cutoff date.
pub fn should_ignore(ignore: &IgnoreConfig, sha: &str, date: DateTime<Utc>) -> bool {
    let shas: HashSet<&str> = ignore.shas.iter().map(String::as_str).collect();
    if shas.contains(sha) {
        return true;
    }
    if let Some(cutoff) = ignore.commits_before {
        if date < cutoff {
            return true;
        }
    }
    false
}
