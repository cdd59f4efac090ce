// quill-bridge/src/bin/quill_probe.rs

use anyhow::{Context, Result};
use quill_bridge::logging;
use quill_bridge::{EditorConfig, EditorOptions, LocalSurface, RichEditor};
use quill_core::SizeModel;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  focus | blur
  value <html>          replace the content
  clear                 clear the content
  insert <html>         insertHtml at the selection
  surround <pre> <post> surround the selection with text
  tag <name>            wrap the selection in <name>
  toggle <name>         toggle <name> around the selection
  placeholder <text>
  css <css>
  select <text>         select the first occurrence of <text>
  type <text>           type at the caret (needs focus)
  html                  print the live document markup
  state                 print controller state
  exit";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    eprintln!("[quill_probe] starting… (Ctrl+C to exit, 'help' for commands)");

    // Optional JSON options file as the only argument.
    let options = match std::env::args().nth(1) {
        Some(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read options file {path}"))?;
            EditorOptions::from_json(&json).context("invalid options file")?
        }
        None => EditorOptions {
            value: Some("<p>Hello from Quill</p>".to_string()),
            placeholder: Some("Start typing".to_string()),
            ..EditorOptions::default()
        },
    };

    let (surface, mut events) = LocalSurface::spawn(&options.namespace, SizeModel::default());
    let config = EditorConfig::from_options(options)
        .on_change(|html| println!("[quill_probe] change: {html}"))
        .on_height_change(|height| println!("[quill_probe] height: {height}"))
        .on_load_end(|| println!("[quill_probe] loaded"));
    let mut editor = RichEditor::new(config, surface);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n[quill_probe] Ctrl+C received, exiting…");
                break;
            }

            event = events.recv() => {
                let Some(event) = event else {
                    eprintln!("[quill_probe] surface closed, exiting…");
                    break;
                };
                editor.handle_surface_event(event);
            }

            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else {
                    eprintln!("\n[quill_probe] stdin closed, exiting…");
                    break;
                };

                let trimmed = line.trim();
                if trimmed.eq_ignore_ascii_case("exit") {
                    eprintln!("[quill_probe] exit requested, exiting…");
                    break;
                }
                run_line(&mut editor, trimmed).await;
            }
        }
    }

    Ok(())
}

async fn run_line(editor: &mut RichEditor<LocalSurface>, line: &str) {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    match verb {
        "" => {}
        "help" => println!("{HELP}"),
        "focus" => editor.focus(),
        "blur" => editor.blur(),
        "value" => editor.set_value(Some(rest)),
        "clear" => editor.set_value(None),
        "insert" => editor.insert_html(rest),
        "surround" => match rest.split_once(' ') {
            Some((before, after)) => editor.surround_selection(before, after),
            None => eprintln!("[quill_probe] usage: surround <pre> <post>"),
        },
        "tag" => editor.surround_selection_tag(rest),
        "toggle" => editor.toggle_selection_tag(rest),
        "placeholder" => editor.set_placeholder(rest),
        "css" => editor.inject_css(rest),
        "select" => {
            let needle = rest.to_string();
            match editor
                .surface()
                .with_runtime(move |rt| rt.select_text(&needle))
                .await
            {
                Ok(Ok(true)) => println!("[quill_probe] selected {rest:?}"),
                Ok(Ok(false)) => println!("[quill_probe] {rest:?} not found"),
                Ok(Err(e)) => eprintln!("[quill_probe] select failed: {e}"),
                Err(e) => eprintln!("[quill_probe] {e}"),
            }
        }
        "type" => {
            let text = rest.to_string();
            if let Err(e) = editor.surface().with_runtime(move |rt| rt.type_text(&text)).await {
                eprintln!("[quill_probe] {e}");
            }
        }
        "html" => match editor.surface().inner_html().await {
            Ok(html) => println!("[quill_probe] html: {html}"),
            Err(e) => eprintln!("[quill_probe] {e}"),
        },
        "state" => println!(
            "[quill_probe] loaded={} height={} content={:?}",
            editor.is_loaded(),
            editor.height(),
            editor.content()
        ),
        other => eprintln!("[quill_probe] unknown command {other:?} (try 'help')"),
    }
}
