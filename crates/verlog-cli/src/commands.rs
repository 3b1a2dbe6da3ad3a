use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;
use verlog_history::{HistoryAction, HistoryStore, JsonCodec, Outcome, StoreConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = build_store(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Push(args) => cmd_push(&store, &args, &format),
        Command::Pop(args) => cmd_pop(&store, &args, &format),
        Command::Delete(args) => cmd_delete(&store, &args, &format),
        Command::Rollback(args) => cmd_rollback(&store, &args, &format),
        Command::Log(args) => cmd_log(&store, &args, &format),
        Command::Verify(args) => cmd_verify(&store, &args, &format),
        Command::Diff(args) => cmd_diff(&store, &args, &format),
    }
}

/// Config file first, then command-line overrides.
fn build_store(cli: &Cli) -> anyhow::Result<HistoryStore> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            StoreConfig::from_toml_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => StoreConfig::default(),
    };
    if let Some(label) = &cli.label {
        config.label = label.clone();
    }
    if let Some(min) = cli.min_token_len {
        config.min_token_len = min;
    }
    debug!(label = %config.label, min_token_len = config.min_token_len, "store configured");
    Ok(HistoryStore::new(config, JsonCodec)?)
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_document(path: &Path, value: &Value) -> anyhow::Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn history_len(store: &HistoryStore, value: &Value) -> anyhow::Result<usize> {
    Ok(store.record_of(value)?.len())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_push(store: &HistoryStore, args: &DocArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut doc = read_document(&args.file)?;
    let outcome = store.push(&mut doc, None)?;
    if outcome.is_applied() {
        write_document(&args.file, &doc)?;
    }
    let entries = history_len(store, &doc)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "applied": outcome.is_applied(),
            "entries": entries,
        })),
        OutputFormat::Text => {
            match outcome {
                Outcome::Applied => println!(
                    "{} Pushed {} ({} entries)",
                    "✓".green().bold(),
                    args.file.display().to_string().bold(),
                    entries
                ),
                Outcome::Unchanged => println!(
                    "{} {} is deleted; push refused",
                    "✗".red().bold(),
                    args.file.display().to_string().bold()
                ),
            }
            Ok(())
        }
    }
}

fn cmd_pop(store: &HistoryStore, args: &DocArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut doc = read_document(&args.file)?;
    let restored = store.pop(&mut doc, None)?;
    report_restore(store, args, format, "Popped", &doc, restored)
}

fn cmd_rollback(
    store: &HistoryStore,
    args: &DocArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut doc = read_document(&args.file)?;
    let restored = store.rollback(&mut doc, None)?;
    report_restore(store, args, format, "Rolled back", &doc, restored)
}

/// Write the restored document, or keep the current one when there is no previous value.
fn report_restore(
    store: &HistoryStore,
    args: &DocArgs,
    format: &OutputFormat,
    verb: &str,
    current: &Value,
    restored: Option<Value>,
) -> anyhow::Result<()> {
    let restored_any = restored.is_some();
    let doc = match restored {
        Some(doc) => doc,
        // Popping a lone `created` entry still shortens the history.
        None => current.clone(),
    };
    write_document(&args.file, &doc)?;
    let entries = history_len(store, &doc)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "restored": restored_any,
            "entries": entries,
        })),
        OutputFormat::Text => {
            if restored_any {
                println!(
                    "{} {} {} ({} entries)",
                    "✓".green().bold(),
                    verb,
                    args.file.display().to_string().bold(),
                    entries
                );
            } else {
                println!("No previous value for {}.", args.file.display());
            }
            Ok(())
        }
    }
}

fn cmd_delete(store: &HistoryStore, args: &DocArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut doc = read_document(&args.file)?;
    let outcome = store.delete(&mut doc, None)?;
    if outcome.is_applied() {
        write_document(&args.file, &doc)?;
    }

    match format {
        OutputFormat::Json => print_json(&json!({ "applied": outcome.is_applied() })),
        OutputFormat::Text => {
            match outcome {
                Outcome::Applied => println!(
                    "{} Deleted {}",
                    "✓".green().bold(),
                    args.file.display().to_string().bold()
                ),
                Outcome::Unchanged => {
                    println!("{} is already deleted.", args.file.display())
                }
            }
            Ok(())
        }
    }
}

fn cmd_log(store: &HistoryStore, args: &LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let doc = read_document(&args.file)?;
    let record = store.record_of(&doc)?;
    let states = store.replay(&record)?;

    let newest_first = states.iter().take(args.limit);
    match format {
        OutputFormat::Json => {
            let entries: Vec<Value> = newest_first
                .map(|state| {
                    let ops = record.history[state.index].diff_ops().len();
                    let mut entry = json!({
                        "index": state.index,
                        "action": state.action.as_str(),
                        "date": state.timestamp.to_rfc3339(),
                        "ops": ops,
                    });
                    if args.show {
                        entry["snapshot"] = json!(state.text);
                    }
                    entry
                })
                .collect();
            print_json(&Value::Array(entries))
        }
        OutputFormat::Text => {
            if states.is_empty() {
                println!("No history.");
                return Ok(());
            }
            for state in newest_first {
                let ops = record.history[state.index].diff_ops().len();
                let action = match state.action {
                    HistoryAction::Deleted => state.action.as_str().red(),
                    HistoryAction::Rollback => state.action.as_str().yellow(),
                    HistoryAction::Created | HistoryAction::Updated => state.action.as_str().green(),
                };
                if args.oneline {
                    println!("{} {} {}", format!("#{}", state.index).yellow(), action, ops);
                } else {
                    println!("{}  {}", format!("#{}", state.index).yellow().bold(), action);
                    println!("  Date: {}", state.timestamp.to_rfc3339().dimmed());
                    println!("  Diff: {} ops", ops);
                }
                if args.show {
                    match &state.text {
                        Some(text) => println!("  {}", text),
                        None => println!("  {}", "(no snapshot)".dimmed()),
                    }
                }
            }
            Ok(())
        }
    }
}

fn cmd_verify(store: &HistoryStore, args: &DocArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let doc = read_document(&args.file)?;
    let record = store.record_of(&doc)?;
    let report = store.validate(&record);

    match format {
        OutputFormat::Json => {
            let violations: Vec<Value> = report
                .violations
                .iter()
                .map(|v| {
                    json!({
                        "index": v.index,
                        "kind": format!("{:?}", v.kind),
                        "description": v.description,
                    })
                })
                .collect();
            print_json(&json!({
                "entries": report.entry_count,
                "valid": report.is_valid(),
                "violations": violations,
            }))?;
        }
        OutputFormat::Text => {
            if report.is_valid() {
                println!(
                    "{} History intact ({} entries)",
                    "✓".green().bold(),
                    report.entry_count
                );
            }
            for v in &report.violations {
                let at = v.index.map_or_else(|| "record".to_string(), |i| format!("#{i}"));
                println!("  {} {} {:?}: {}", "✗".red(), at.yellow(), v.kind, v.description);
            }
        }
    }

    if !report.is_valid() {
        bail!("history has {} violation(s)", report.violations.len());
    }
    Ok(())
}

fn cmd_diff(store: &HistoryStore, args: &DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let newer = fs::read_to_string(&args.newer)
        .with_context(|| format!("reading {}", args.newer.display()))?;
    let older = fs::read_to_string(&args.older)
        .with_context(|| format!("reading {}", args.older.display()))?;
    let ops = store.engine().diff(&newer, &older);

    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&ops)?),
        OutputFormat::Text => {
            if ops.is_empty() {
                println!("No changes.");
            }
            for op in &ops {
                println!(
                    "{} {} {:?}",
                    format!("@{}", op.start).cyan(),
                    format!("-{}", op.size).red(),
                    op.substitution
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["verlog"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn write_doc(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        write_document(&path, value).unwrap();
        path
    }

    fn doc_items(path: &Path) -> Value {
        read_document(path).unwrap()["items"].clone()
    }

    fn entries(path: &Path) -> usize {
        let doc = read_document(path).unwrap();
        HistoryStore::default().record_of(&doc).unwrap().len()
    }

    fn append_item(path: &Path, item: &str) {
        let mut doc = read_document(path).unwrap();
        doc["items"].as_array_mut().unwrap().push(json!(item));
        write_document(path, &doc).unwrap();
    }

    #[test]
    fn push_then_rollback_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.json", &json!({"title": "X", "items": ["A", "B"]}));
        let file = path.to_str().unwrap();

        run(&["push", file]).unwrap();
        assert_eq!(entries(&path), 1);

        append_item(&path, "C");
        run(&["push", file]).unwrap();
        assert_eq!(entries(&path), 2);

        run(&["rollback", file]).unwrap();
        assert_eq!(doc_items(&path), json!(["A", "B"]));
        assert_eq!(entries(&path), 3);

        run(&["log", file, "--show"]).unwrap();
        run(&["--format", "json", "log", file]).unwrap();
        run(&["verify", file]).unwrap();
    }

    #[test]
    fn pop_restores_and_shortens_history() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.json", &json!({"items": ["A"]}));
        let file = path.to_str().unwrap();

        run(&["push", file]).unwrap();
        append_item(&path, "B");
        run(&["push", file]).unwrap();

        run(&["pop", file]).unwrap();
        assert_eq!(doc_items(&path), json!(["A"]));
        assert_eq!(entries(&path), 1);

        run(&["pop", file]).unwrap();
        assert_eq!(entries(&path), 0);
        run(&["--format", "json", "pop", file]).unwrap();
    }

    #[test]
    fn delete_blocks_push() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.json", &json!({"items": ["A"]}));
        let file = path.to_str().unwrap();

        run(&["push", file]).unwrap();
        run(&["delete", file]).unwrap();
        run(&["delete", file]).unwrap();
        assert_eq!(entries(&path), 2);

        append_item(&path, "B");
        run(&["push", file]).unwrap();
        assert_eq!(entries(&path), 2);
        assert_eq!(doc_items(&path), json!(["A", "B"]));
    }

    #[test]
    fn verify_fails_on_corrupt_history() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.json", &json!({"items": ["A"]}));
        let file = path.to_str().unwrap();
        run(&["push", file]).unwrap();

        let mut doc = read_document(&path).unwrap();
        doc["versioning"]["strLast"] = json!("not json");
        write_document(&path, &doc).unwrap();

        assert!(run(&["verify", file]).is_err());
        assert!(run(&["--format", "json", "verify", file]).is_err());
    }

    #[test]
    fn custom_label_from_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("verlog.toml");
        fs::write(&config, "label = \"_history\"\n").unwrap();
        let path = write_doc(&dir, "doc.json", &json!({"items": []}));

        run(&["--config", config.to_str().unwrap(), "push", path.to_str().unwrap()]).unwrap();
        let doc = read_document(&path).unwrap();
        assert!(doc.get("_history").is_some());
        assert!(doc.get("versioning").is_none());
    }

    #[test]
    fn invalid_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.json", &json!({}));
        assert!(run(&["--min-token-len", "0", "push", path.to_str().unwrap()]).is_err());
    }

    #[test]
    fn diff_between_files() {
        let dir = TempDir::new().unwrap();
        let newer = dir.path().join("new.txt");
        let older = dir.path().join("old.txt");
        fs::write(&newer, "our reveals now are ended").unwrap();
        fs::write(&older, "forget our reveals, but now are not ended").unwrap();

        run(&["diff", newer.to_str().unwrap(), older.to_str().unwrap()]).unwrap();
        run(&["--format", "json", "diff", newer.to_str().unwrap(), older.to_str().unwrap()])
            .unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(run(&["push", path.to_str().unwrap()]).is_err());
    }
}
