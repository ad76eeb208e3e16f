//! Interactive wizard for step-by-step config generation.

use std::path::{Path, PathBuf};

use console::style;
use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::model::{Config, Defaults, RouteConfig};
use crate::config::validation::{validate, validate_method, validate_prefix, validate_target_url};
use crate::error::PorticoError;

use super::serialize::serialize_config;

/// Map a `dialoguer::Error` to a `PorticoError`.
fn map_prompt_err(e: dialoguer::Error) -> PorticoError {
    PorticoError::Io(std::io::Error::other(e.to_string()))
}

pub fn run(args: &InitArgs) -> Result<(), PorticoError> {
    // Ensure we're running in an interactive terminal
    if !console::Term::stdout().is_term() {
        return Err(PorticoError::Io(std::io::Error::other(
            "interactive mode requires a terminal (TTY). Use portico init without -i for non-interactive mode.",
        )));
    }

    println!(
        "\n  {} Config Wizard\n  {}\n",
        style("Portico").cyan().bold(),
        style("─────────────────────").dim()
    );

    // Step 1: Output settings
    println!("  {}\n", style("Step 1: Output").bold());
    let format = prompt_format(args)?;
    let output = prompt_output(args, &format)?;

    // Step 2: Defaults
    println!("\n  {}\n", style("Step 2: Defaults").bold());
    let defaults = prompt_defaults()?;

    // Step 3: Routes
    println!("\n  {}\n", style("Step 3: Routes").bold());
    let routes = prompt_routes()?;

    let config = Config { defaults, routes };

    // Validate the assembled config
    if let Err(errors) = validate(&config) {
        eprintln!(
            "\n  {} Config has validation errors:",
            style("!").red().bold()
        );
        for e in &errors {
            eprintln!("    {e}");
        }
        return Err(PorticoError::ConfigValidation { errors });
    }

    // Step 4: Review
    println!("\n  {}\n", style("Step 4: Review").bold());
    print_summary(&config, &format, &output);

    let confirm = Confirm::new()
        .with_prompt(format!("Write config to {}?", output.display()))
        .default(true)
        .interact()
        .map_err(map_prompt_err)?;

    if !confirm {
        println!("  Aborted.");
        return Ok(());
    }

    // Handle existing file
    if output.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", output.display()))
            .default(false)
            .interact()
            .map_err(map_prompt_err)?;
        if !overwrite {
            println!("  Aborted.");
            return Ok(());
        }
    }

    let content = serialize_config(&config, &format)?;
    std::fs::write(&output, content)?;
    println!(
        "\n  {} Created {}",
        style("✓").green().bold(),
        output.display()
    );
    Ok(())
}

fn prompt_format(args: &InitArgs) -> Result<ConfigFormat, PorticoError> {
    let formats = &["yaml", "json"];
    let default_idx = match args.format {
        ConfigFormat::Yaml => 0,
        ConfigFormat::Json => 1,
    };

    let selection = Select::new()
        .with_prompt("Config format")
        .items(formats)
        .default(default_idx)
        .interact()
        .map_err(map_prompt_err)?;

    Ok(match selection {
        0 => ConfigFormat::Yaml,
        1 => ConfigFormat::Json,
        _ => unreachable!(),
    })
}

fn prompt_output(args: &InitArgs, format: &ConfigFormat) -> Result<PathBuf, PorticoError> {
    let default_path = args.output.as_ref().map_or_else(
        || format!("portico.{}", format.extension()),
        |p| p.display().to_string(),
    );

    let path_str: String = Input::new()
        .with_prompt("Output file path")
        .default(default_path)
        .interact_text()
        .map_err(map_prompt_err)?;

    Ok(PathBuf::from(path_str))
}

fn prompt_defaults() -> Result<Defaults, PorticoError> {
    let base = Defaults::default();

    let timeout: u64 = Input::new()
        .with_prompt("Default upstream timeout (ms)")
        .default(base.timeout)
        .validate_with(|input: &u64| -> Result<(), String> {
            if *input == 0 {
                Err("timeout must be greater than 0".into())
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(map_prompt_err)?;

    let path_pattern: String = Input::new()
        .with_prompt("Default path pattern after the prefix")
        .default(base.path_pattern)
        .interact_text()
        .map_err(map_prompt_err)?;

    let forward_headers = Confirm::new()
        .with_prompt("Forward client headers upstream?")
        .default(true)
        .interact()
        .map_err(map_prompt_err)?;

    let proxy_headers = Confirm::new()
        .with_prompt("Add proxy headers (X-Forwarded-For, Via)?")
        .default(true)
        .interact()
        .map_err(map_prompt_err)?;

    let strip_hop_by_hop = Confirm::new()
        .with_prompt("Strip hop-by-hop headers?")
        .default(true)
        .interact()
        .map_err(map_prompt_err)?;

    Ok(Defaults {
        timeout,
        path_pattern,
        forward_headers,
        proxy_headers,
        strip_hop_by_hop,
    })
}

fn prompt_routes() -> Result<Vec<RouteConfig>, PorticoError> {
    let mut routes = Vec::new();
    loop {
        if !routes.is_empty() {
            let add_another = Confirm::new()
                .with_prompt("Add another route?")
                .default(false)
                .interact()
                .map_err(map_prompt_err)?;
            if !add_another {
                break;
            }
        }
        let idx = routes.len() + 1;
        println!(
            "\n  {} Route {} {}",
            style("──").dim(),
            idx,
            style("──").dim()
        );
        routes.push(prompt_single_route()?);
    }
    Ok(routes)
}

fn prompt_single_route() -> Result<RouteConfig, PorticoError> {
    let prefix: String = Input::new()
        .with_prompt("Route prefix (e.g. /api/orders)")
        .validate_with(|input: &String| -> Result<(), String> { validate_prefix(input) })
        .interact_text()
        .map_err(map_prompt_err)?;

    let target: String = Input::new()
        .with_prompt("Upstream target URL")
        .validate_with(|input: &String| -> Result<(), String> { validate_target_url(input) })
        .interact_text()
        .map_err(map_prompt_err)?;

    let docs_str: String = Input::new()
        .with_prompt("Description (blank for none)")
        .default(String::new())
        .allow_empty(true)
        .interact_text()
        .map_err(map_prompt_err)?;

    let docs = if docs_str.is_empty() {
        None
    } else {
        Some(docs_str)
    };

    let methods_str: String = Input::new()
        .with_prompt("HTTP methods (comma-separated, or * for all)")
        .default("*".into())
        .validate_with(|input: &String| -> Result<(), String> {
            if input.trim() == "*" {
                return Ok(());
            }
            for m in input.split(',') {
                let trimmed = m.trim();
                if trimmed.is_empty() {
                    return Err("method cannot be empty".into());
                }
                validate_method(trimmed)?;
            }
            Ok(())
        })
        .interact_text()
        .map_err(map_prompt_err)?;

    let methods = if methods_str.trim() == "*" {
        None
    } else {
        Some(
            methods_str
                .split(',')
                .map(|m| m.trim().to_uppercase())
                .collect(),
        )
    };

    let timeout_str: String = Input::new()
        .with_prompt("Route timeout override (ms, blank for default)")
        .default(String::new())
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            if input.is_empty() {
                return Ok(());
            }
            match input.parse::<u64>() {
                Ok(0) => Err("timeout must be greater than 0".into()),
                Ok(_) => Ok(()),
                Err(_) => Err("must be a number".into()),
            }
        })
        .interact_text()
        .map_err(map_prompt_err)?;

    let timeout = if timeout_str.is_empty() {
        None
    } else {
        timeout_str.parse::<u64>().ok()
    };

    let prefix_rewrite: String = Input::new()
        .with_prompt("Prefix rewrite (replacement for the prefix, blank to strip)")
        .default(String::new())
        .allow_empty(true)
        .interact_text()
        .map_err(map_prompt_err)?;

    Ok(RouteConfig {
        prefix,
        target,
        docs,
        path_pattern: None,
        methods,
        timeout,
        proxy_type: "http".into(),
        prefix_rewrite,
    })
}

fn print_summary(config: &Config, format: &ConfigFormat, output: &Path) {
    println!(
        "  {}",
        style("┌─────────────────────────────────────────────┐").dim()
    );
    println!(
        "  {}  Format:   {:<35}{}",
        style("│").dim(),
        format.extension(),
        style("│").dim()
    );
    println!(
        "  {}  Output:   {:<35}{}",
        style("│").dim(),
        output.display(),
        style("│").dim()
    );
    println!(
        "  {}  Timeout:  {:<35}{}",
        style("│").dim(),
        format!("{}ms", config.defaults.timeout),
        style("│").dim()
    );
    println!(
        "  {}  Pattern:  {:<35}{}",
        style("│").dim(),
        config.defaults.path_pattern,
        style("│").dim()
    );
    println!(
        "  {}  Routes:   {:<35}{}",
        style("│").dim(),
        config.routes.len(),
        style("│").dim()
    );

    for route in &config.routes {
        let methods = route
            .methods
            .as_ref()
            .map_or_else(|| "*".to_string(), |m| m.join(", "));
        println!(
            "  {}    {} [{}] \u{2192} {}",
            style("│").dim(),
            route.prefix,
            methods,
            route.target,
        );
        if let Some(timeout) = route.timeout {
            println!(
                "  {}      timeout: {timeout}ms",
                style("│").dim()
            );
        }
        if !route.prefix_rewrite.is_empty() {
            println!(
                "  {}      rewrite: {}",
                style("│").dim(),
                route.prefix_rewrite
            );
        }
    }

    println!(
        "  {}\n",
        style("└─────────────────────────────────────────────┘").dim()
    );
}
