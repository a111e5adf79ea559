use std::io::Write;
use std::path::{Path, PathBuf};

use actions::{build_chord_actions, keycodes, KeyEvent};
use app_core::{AppState, KeyConfig, Profile};
use storage::{Compression, ExportOptions, ImportPreview};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "inspect" => cmd_inspect(&args).await,
        "export" => cmd_export(&args).await,
        "xml" => cmd_xml(&args).await,
        "new" => cmd_new(&args).await,
        "bmp" => cmd_bmp(&args).await,
        "keycode" => cmd_keycode(&args),
        "chord" => cmd_chord(&args),
        other => anyhow::bail!("unknown command: {other} (run `cli help`)"),
    }
}

fn print_help() {
    eprintln!(
        r#"macropad-config cli

USAGE:
  cli inspect <config.zip|config.xml> [--json]
  cli export <config.zip|config.xml> <out.zip> [--stored]
  cli xml <config.zip|config.xml> <out.xml>
  cli new <out.zip> [profile name]
  cli bmp <file.bmp> [out.png]
  cli keycode <code|name>
  cli chord <code> [--ctrl] [--shift] [--alt] [--meta]
"#
    );
}

async fn cmd_inspect(args: &[String]) -> anyhow::Result<()> {
    let input = path_arg(args, 2, "input")?;
    let json = flag(args, 3, "--json")?;

    let preview = load_preview(&input).await?;
    print_warnings(&preview.warnings);

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    if !preview.path_prefix.is_empty() {
        println!("config found in: {}", preview.path_prefix);
    }
    println!(
        "profiles: {}  bitmaps: {}/{}  settings: {}",
        preview.profiles.len(),
        preview.bitmaps_found,
        preview.bitmaps_total,
        if preview.settings_xml.is_some() {
            "preserved"
        } else {
            "default"
        }
    );
    for profile in &preview.profiles {
        print_profile(profile);
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!();
    println!(
        "{}  wheel: {} {}",
        profile.name,
        profile.wheel_mode.value,
        keycodes::display_name(profile.wheel_key.value)
    );
    for (i, key) in profile.keys.iter().enumerate() {
        println!("  {} {}  {}", i + 1, key.icon, describe_key(key));
    }
}

fn describe_key(key: &KeyConfig) -> String {
    let label = if key.label.is_empty() {
        "(no label)".to_string()
    } else {
        format!("{:?}", key.label)
    };

    let steps: Vec<String> = key
        .assigned_actions()
        .map(|a| {
            let name = keycodes::name(a.keycode).unwrap_or("Unknown");
            if a.delay_ms > 0 {
                format!("+{}ms {name}", a.delay_ms)
            } else {
                name.to_string()
            }
        })
        .collect();

    let bitmap = match key.bmp.as_ref().map(|b| b.load()) {
        None => "no bitmap".to_string(),
        Some(Err(e)) => format!("bitmap unreadable: {e}"),
        Some(Ok(bytes)) => match render::decode(&bytes) {
            Ok(bmp) => format!("bitmap {}x{}", bmp.width, bmp.height),
            Err(e) => format!("bitmap invalid: {e}"),
        },
    };

    if steps.is_empty() {
        format!("{label}  [unassigned]  {bitmap}")
    } else {
        format!("{label}  [{}]  {bitmap}", steps.join(" + "))
    }
}

async fn cmd_export(args: &[String]) -> anyhow::Result<()> {
    let input = path_arg(args, 2, "input")?;
    let output = path_arg(args, 3, "output")?;
    let stored = flag(args, 4, "--stored")?;

    let preview = load_preview(&input).await?;
    let state = commit_preview(preview, &mut std::io::stderr().lock())?;
    let options = ExportOptions {
        compression: if stored {
            Compression::Stored
        } else {
            Compression::Deflated
        },
    };
    write_archive(state, options, &output).await
}

async fn cmd_xml(args: &[String]) -> anyhow::Result<()> {
    let input = path_arg(args, 2, "input")?;
    let output = path_arg(args, 3, "output")?;

    let preview = load_preview(&input).await?;
    let state = commit_preview(preview, &mut std::io::stderr().lock())?;

    let built = storage::export_xml(&state)?;
    print_warnings(&built.warnings);
    tokio::fs::write(&output, built.xml_text).await?;
    println!("wrote {}", output.display());
    Ok(())
}

async fn cmd_new(args: &[String]) -> anyhow::Result<()> {
    let output = path_arg(args, 2, "output")?;

    let mut state = AppState::new();
    if let Some(name) = args.get(3) {
        let id = state.selected_profile().id;
        state.rename_profile(id, name)?;
    }
    write_archive(state, ExportOptions::default(), &output).await
}

async fn cmd_bmp(args: &[String]) -> anyhow::Result<()> {
    let input = path_arg(args, 2, "bitmap")?;
    let bytes = tokio::fs::read(&input).await?;

    let bitmap = render::decode(&bytes)?;
    println!("{}: {}x{} monochrome", input.display(), bitmap.width, bitmap.height);

    if let Some(output) = args.get(3) {
        let png = tokio::task::spawn_blocking(move || render::raster::bmp_to_png(&bytes)).await??;
        tokio::fs::write(output, png).await?;
        println!("wrote {output}");
    }
    Ok(())
}

fn cmd_keycode(args: &[String]) -> anyhow::Result<()> {
    let raw = args
        .get(2)
        .ok_or_else(|| anyhow::anyhow!("missing keycode (usage: cli keycode <code|name>)"))?;

    let code = match raw.parse::<u32>() {
        Ok(code) => code,
        Err(_) => keycodes::code_for_name(raw)
            .ok_or_else(|| anyhow::anyhow!("unknown key name: {raw}"))?,
    };

    if !keycodes::is_valid_keycode(code) {
        anyhow::bail!("unknown keycode: {code}");
    }
    let modifier = if keycodes::is_modifier(code) {
        "  (modifier)"
    } else {
        ""
    };
    println!("{code}  {}{modifier}", keycodes::display_name(code));
    Ok(())
}

fn cmd_chord(args: &[String]) -> anyhow::Result<()> {
    let raw = args
        .get(2)
        .ok_or_else(|| anyhow::anyhow!("missing keycode (usage: cli chord <code> [--ctrl] ...)"))?;

    let mut event = KeyEvent::new(raw.parse::<u32>()?);
    for arg in &args[3..] {
        match arg.as_str() {
            "--ctrl" => event.ctrl = true,
            "--shift" => event.shift = true,
            "--alt" => event.alt = true,
            "--meta" => event.meta = true,
            other => anyhow::bail!("unknown flag for chord: {other}"),
        }
    }

    if !actions::is_valid_capture_key(&event) {
        anyhow::bail!("{} cannot be captured on its own", keycodes::display_name(event.key_code));
    }

    let capture = build_chord_actions(&event);
    if let Some(warning) = &capture.warning {
        eprintln!("warning: {warning}");
    }
    for (i, slot) in capture.actions.iter().enumerate() {
        match slot {
            Some(a) => println!("{}  {a}  {}", i + 1, keycodes::display_name(a.keycode)),
            None => println!("{}  (empty)", i + 1),
        }
    }
    Ok(())
}

/// `.zip` goes through the archive reader, anything else is treated as XML.
async fn load_preview(path: &Path) -> anyhow::Result<ImportPreview> {
    let bytes = tokio::fs::read(path).await?;

    let is_zip = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
        || bytes.starts_with(b"PK\x03\x04");
    debug!(path = %path.display(), zip = is_zip, bytes = bytes.len(), "loading configuration");

    let preview = if is_zip {
        tokio::task::spawn_blocking(move || storage::preview_import(&bytes)).await??
    } else {
        let text = String::from_utf8(bytes)?;
        storage::preview_xml(&text)?
    };
    Ok(preview)
}

async fn write_archive(state: AppState, options: ExportOptions, output: &Path) -> anyhow::Result<()> {
    let exported = tokio::task::spawn_blocking(move || storage::export_archive(&state, options)).await??;
    print_warnings(&exported.warnings);

    tokio::fs::write(output, &exported.bytes).await?;
    println!("wrote {} ({} bytes)", output.display(), exported.bytes.len());
    Ok(())
}

/// Import warnings are reported before the preview replaces any state.
fn commit_preview(preview: ImportPreview, out: &mut impl Write) -> std::io::Result<AppState> {
    write_warnings(out, &preview.warnings)?;
    Ok(preview.into_state())
}

fn write_warnings(out: &mut impl Write, warnings: &[String]) -> std::io::Result<()> {
    for w in warnings {
        writeln!(out, "warning: {w}")?;
    }
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    let _ = write_warnings(&mut std::io::stderr().lock(), warnings);
}

fn path_arg(args: &[String], idx: usize, what: &str) -> anyhow::Result<PathBuf> {
    let raw = args
        .get(idx)
        .ok_or_else(|| anyhow::anyhow!("missing {what} path (run `cli help`)"))?;
    Ok(PathBuf::from(raw))
}

fn flag(args: &[String], idx: usize, expected: &str) -> anyhow::Result<bool> {
    match args.get(idx).map(|s| s.as_str()) {
        None => Ok(false),
        Some(f) if f == expected => Ok(true),
        Some(other) => anyhow::bail!("unexpected argument: {other}"),
    }
}
