mod cli;

use std::path::PathBuf;

use rustic_files_core::{RusticFiles, ToolResult};
use serde_json::{json, Map, Value};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("rustic-files failed: {error}");
            std::process::exit(1);
        }
    }
}

/// Builds tool arguments, leaving out options the user did not give.
fn arguments(pairs: Vec<(&str, Option<Value>)>) -> Value {
    let map = pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value)))
        .collect::<Map<String, Value>>();
    Value::Object(map)
}

fn tool_call(command: cli::Command) -> Option<(&'static str, Value)> {
    let call = match command {
        cli::Command::List {
            path,
            recursive,
            group,
            hidden,
            sort_by,
            order,
        } => (
            "list_files_and_folders",
            json!({
                "folder_path": path,
                "recursive": recursive,
                "group_by_extension": group,
                "include_hidden": hidden,
                "sort_by": sort_by.as_str(),
                "sort_order": order.as_str(),
            }),
        ),
        cli::Command::Stats { path, hash } => (
            "get_file_stats",
            json!({ "file_path": path, "include_hash": hash }),
        ),
        cli::Command::Search {
            path,
            pattern,
            content,
            extension,
            hidden,
            case_sensitive,
            max_results,
        } => (
            "search_files",
            arguments(vec![
                ("search_path", Some(json!(path))),
                ("name_pattern", pattern.map(Value::from)),
                ("content_search", content.map(Value::from)),
                ("extension", extension.map(Value::from)),
                ("include_hidden", Some(json!(hidden))),
                ("case_sensitive", Some(json!(case_sensitive))),
                ("max_results", max_results.map(Value::from)),
            ]),
        ),
        cli::Command::Organize {
            path,
            target,
            copy,
            dry_run,
        } => (
            "organize_by_extension",
            arguments(vec![
                ("source_dir", Some(json!(path))),
                ("target_dir", target.map(Value::from)),
                ("move_files", Some(json!(!copy))),
                ("dry_run", Some(json!(dry_run))),
            ]),
        ),
        cli::Command::Tools | cli::Command::Serve { .. } => return None,
    };
    Some(call)
}

fn print_json(value: &Value) -> rustic_files_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns `Ok(false)` when a tool reported an error payload.
fn run() -> rustic_files_core::Result<bool> {
    let args = cli::Cli::parse_args();
    let config_path = args.config.as_ref().map(PathBuf::from);
    let app = RusticFiles::from_config_path(config_path.as_deref())?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| app.config().logging.level.clone());
    rustic_files_core::logging::init_tracing(&level);

    let runtime = tokio::runtime::Runtime::new().map_err(|err| {
        rustic_files_core::Error::Config(format!("failed to create tokio runtime: {err}"))
    })?;

    match args.command {
        cli::Command::Tools => {
            print_json(&json!({ "tools": app.tool_definitions() }))?;
            Ok(true)
        }
        cli::Command::Serve { transport } => {
            tracing::info!(
                ?transport,
                max_workers = app.config().pool.max_workers,
                "starting {} {}",
                app.config().server.name,
                app.config().server.version
            );
            runtime.block_on(app.serve_stdio())?;
            // Stdin reads may still be parked on a blocking thread.
            runtime.shutdown_background();
            Ok(true)
        }
        command => {
            let Some((name, tool_args)) = tool_call(command) else {
                return Ok(true);
            };
            let ToolResult { success, payload } = runtime.block_on(app.call_tool(name, tool_args))?;
            print_json(&payload)?;
            Ok(success)
        }
    }
}
