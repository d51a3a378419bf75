use clap::Parser;
use log::info;
use stackscope::{
    analyzer::{
        self,
        display::{display_report, render_json, render_support, DisplayMode},
        RuleStore, RuleType,
    },
    cli::{Cli, Commands},
    config::{self, Config},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> stackscope::Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            path,
            rules,
            output,
            json,
            summary,
        } => handle_analyze(config, path, rules, output, json, summary, cli.quiet),
        Commands::Support {
            frameworks,
            components,
            rules,
        } => handle_support(&config, frameworks, components, rules),
    }
}

fn load_rules(config: &Config, rules: Option<PathBuf>) -> stackscope::Result<RuleStore> {
    let rules_dir = rules.or_else(|| config.rules.rules_dir.clone());
    Ok(RuleStore::load(rules_dir.as_deref())?)
}

fn handle_analyze(
    mut config: Config,
    path: PathBuf,
    rules: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
    summary: bool,
    quiet: bool,
) -> stackscope::Result<()> {
    let store = load_rules(&config, rules)?;
    let mode = if json {
        DisplayMode::Json
    } else if summary {
        DisplayMode::Summary
    } else {
        DisplayMode::Text
    };
    config.analysis.show_progress &= mode == DisplayMode::Text && !quiet;

    let report = analyzer::analyze_project(&path, &store, &config.analysis)?;

    if let Some(output) = output {
        write_report(&output, &render_json(&report)?)?;
        info!("Report written to {}", output.display());
        if !quiet {
            println!("Report written to {}", output.display());
        }
        return Ok(());
    }

    if !quiet {
        display_report(&report, mode)?;
    }
    Ok(())
}

fn write_report(output: &Path, json: &str) -> stackscope::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, json)?;
    Ok(())
}

fn handle_support(
    config: &Config,
    frameworks: bool,
    components: bool,
    rules: Option<PathBuf>,
) -> stackscope::Result<()> {
    let store = load_rules(config, rules)?;
    let show_all = !frameworks && !components;

    let framework_list =
        (show_all || frameworks).then(|| store.frameworks.supported(RuleType::Framework));
    let component_list =
        (show_all || components).then(|| store.frameworks.supported(RuleType::Component));

    println!(
        "{}",
        render_support(framework_list.as_deref(), component_list.as_deref())
    );
    Ok(())
}
