// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::{bail, Context, Result};
use scoreparts::{EditScript, EditorConfig, PartsEditor, ScoreFile, ScoreView};
use std::env;
use tracing::{info, Level};

fn print_usage() {
    println!("SCOREPARTS - Part, instrument and staff editor");
    println!();
    println!("Usage: scoreparts [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --list <SCORE>                     List parts, instruments and staves of a score file");
    println!("  --apply <SCORE> <SCRIPT> [--out F] Apply an edit script and print (or write) the result");
    println!();
    println!("Options:");
    println!("  --config <FILE>                    Editor settings (TOML)");
    println!("  --verbose                          Log every edit");
    println!("  --help                             Show this help message");
}

fn load_config(path: Option<&str>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::load(path),
        None => Ok(EditorConfig::default()),
    }
}

fn open_editor(score_path: &str, config: EditorConfig) -> Result<PartsEditor> {
    let file = ScoreFile::load(score_path)?;
    let score = file
        .build(config.history_limit)
        .with_context(|| format!("Failed to build score from {}", score_path))?;
    Ok(PartsEditor::with_config(score, config))
}

fn list_score(editor: &mut PartsEditor) {
    let views = editor.score().views();
    for view in views {
        let title = match view {
            ScoreView::Master => "Master".to_string(),
            ScoreView::Excerpt(id) => editor
                .score()
                .excerpt(id)
                .map_or_else(|| id.to_string(), |e| e.title.clone()),
        };
        println!("{}", title);
        editor.set_current_view(view);

        let parts: Vec<_> = editor.current_score().parts().to_vec();
        for part in parts {
            let shown = if part.visible { "" } else { " (hidden)" };
            println!("  {} [{}]{}", part.name, part.id, shown);
            for (tick, instrument) in &part.instruments {
                println!("    @{:<6} {} [{}]", tick, instrument.long_name, instrument.id);
                for staff in editor.staff_list(&part.id, &instrument.id).iter() {
                    let linked = if staff.is_linked() { " linked" } else { "" };
                    println!("      staff {} {:?}{}", staff.id, staff.staff_type.preset, linked);
                }
            }
        }
    }
    editor.set_current_view(ScoreView::Master);
}

fn apply_script(editor: &mut PartsEditor, script_path: &str, out: Option<&str>) -> Result<()> {
    let script = EditScript::load(script_path)?;
    let applied = script.apply(editor)?;
    info!(applied, "edit script applied");

    let result = ScoreFile::from_score(editor.score());
    match out {
        Some(path) => {
            result.save(path)?;
            println!("Applied {} operations, wrote {}", applied, path);
        }
        None => print!("{}", result.to_yaml()?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let verbose = take_flag(&mut args, "--verbose");
    let config_path = take_option(&mut args, "--config")?;
    let out = take_option(&mut args, "--out")?;

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(config_path.as_deref())?;

    match args.first().map(|s| s.as_str()) {
        Some("--list") => {
            let Some(score) = args.get(1) else {
                bail!("--list requires a score file");
            };
            let mut editor = open_editor(score, config)?;
            list_score(&mut editor);
        }
        Some("--apply") => {
            let (Some(score), Some(script)) = (args.get(1), args.get(2)) else {
                bail!("--apply requires a score file and an edit script");
            };
            let mut editor = open_editor(score, config)?;
            apply_script(&mut editor, script, out.as_deref())?;
        }
        Some("--help") | None => print_usage(),
        Some(other) => {
            eprintln!("Unknown option: {}", other);
            print_usage();
        }
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    }
}

fn take_option(args: &mut Vec<String>, option: &str) -> Result<Option<String>> {
    let Some(index) = args.iter().position(|a| a == option) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        bail!("{} requires a value", option);
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}
