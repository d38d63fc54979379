use anyhow::Result;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use versionaire::config::{load_configuration, resolve};
use versionaire::format_parser::parse_format_string;
use versionaire::{exporter, GitVersioner};

fn main() -> Result<()> {
    let (args, file) = load_configuration()?;

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = resolve(&args, &file)?;

    if config.show_config {
        println!("{}", toml::to_string_pretty(&to_config_file(&config))?);
        return Ok(());
    }

    let version = GitVersioner::calculate_version(&config)?;

    exporter::export_to_build_agent(&version)?;

    match args.output.as_str() {
        "short" => println!("{}", version.sem_ver),
        "full" => println!("{}", version.full_sem_ver),
        "msbuild" => println!("{}", render_msbuild(&version)?),
        _ => println!("{}", serde_json::to_string_pretty(&version)?),
    }

    Ok(())
}

/// Renders `--output msbuild` as an MSBuild `<PropertyGroup>` element, one
/// `<Field>{Field}</Field>` line per `GitVersion` variable, through the same
/// format template engine the custom-format output uses (spec §10.6).
fn render_msbuild(version: &versionaire::GitVersion) -> Result<String> {
    let value = serde_json::to_value(version)?;
    let mut variables = HashMap::new();
    let mut keys: Vec<String> = Vec::new();
    if let Some(map) = value.as_object() {
        for (key, raw) in map {
            let rendered = match raw {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            variables.insert(key.clone(), rendered);
            keys.push(key.clone());
        }
    }
    keys.sort();

    let mut template = String::from("<PropertyGroup>\n");
    for key in &keys {
        template.push_str(&format!("  <{key}>{{{key}}}</{key}>\n"));
    }
    template.push_str("</PropertyGroup>");

    parse_format_string(&template, &variables).map_err(|e| anyhow::anyhow!(e))
}

fn to_config_file(config: &versionaire::Configuration) -> versionaire::config::ConfigurationFile {
    versionaire::config::ConfigurationFile {
        next_version: config.next_version.as_ref().map(|v| v.render(versionaire::semver_model::RenderFormat::Short)),
        tag_prefix: Some(config.tag_prefix.clone()),
        current_branch: config.current_branch_override.clone(),
        commit_message_incrementing: None,
        continuous_delivery: None,
        merge_message_formats: Some(config.merge_message_formats.clone()),
        ignore: Some(config.ignore.clone()),
        branches: Some(config.branches.clone()),
        main_branch: None,
        release_branch: None,
        feature_branch: None,
        version_pattern: None,
        pre_release_tag: None,
    }
}
