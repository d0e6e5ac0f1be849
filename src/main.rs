use std::path::PathBuf;
use std::time::Duration;

use toastling::config::{self, OptionsPatch};
use toastling::dom::{style, Document, SharedDocument};
use toastling::notifier::NotifierEvent;
use toastling::service::AsyncNotifier;

#[tokio::main]
async fn main() -> toastling::error::Result<()> {
    let mut args = pico_args::Arguments::from_env();

    let config_path: Option<PathBuf> = args.opt_value_from_str("--config").unwrap();
    let save_preset = args.contains("--save-preset");
    let update_message: Option<String> = args.opt_value_from_str("--update").unwrap();
    let close_after: Option<u64> = args.opt_value_from_str("--close-after").unwrap();

    let mut patch = match &config_path {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    if let Some(message) = args.opt_value_from_str::<_, String>("--message").unwrap() {
        patch.message = Some(message);
    }
    if let Some(ms) = args.opt_value_from_str::<_, u64>("--duration").unwrap() {
        patch.duration_ms = Some(ms);
    }
    if args.contains("--infinite") {
        patch.infinite = Some(true);
    }
    if let Some(position) = args.opt_value_from_str::<_, String>("--position").unwrap() {
        patch.position = Some(position);
    }
    if args.contains("--html") {
        patch.render_html = Some(true);
    }
    if args.contains("--error") {
        patch.is_error = Some(true);
    }
    let style_args: Vec<String> = args.values_from_str("--style").unwrap();
    if !style_args.is_empty() {
        let mut styles = patch.styles.take().unwrap_or_default();
        for declaration in &style_args {
            styles.extend(style::parse_inline(declaration));
        }
        patch.styles = Some(styles);
    }

    for leftover in args.finish() {
        eprintln!("ignoring unrecognized argument: {leftover:?}");
    }

    if save_preset {
        config::save(&patch)?;
        if let Some(path) = config::default_preset_path() {
            println!("preset saved to {}", path.display());
        }
    }

    // An infinite toast would keep the demo alive forever.
    let close_after = match (patch.infinite, close_after) {
        (Some(true), None) => Some(2_000),
        (_, chosen) => chosen,
    };

    let document = Document::shared();
    let mut driver = AsyncNotifier::spawn(document.clone(), &patch);

    driver.show()?;
    if !wait_for(&mut driver, &document, &NotifierEvent::Shown).await {
        return Ok(());
    }

    if let Some(message) = update_message {
        // Let the first paint land before refreshing.
        tokio::time::sleep(Duration::from_millis(600)).await;
        driver.update(OptionsPatch::new().with_message(message))?;
        if !wait_for(&mut driver, &document, &NotifierEvent::Updated).await {
            return Ok(());
        }
    }

    if let Some(ms) = close_after {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        driver.close()?;
    }

    wait_for(&mut driver, &document, &NotifierEvent::Detached).await;
    let _ = driver.shutdown();
    Ok(())
}

/// Prints events as they arrive until `target` shows up. Returns `false`
/// when the driver reports an error or stops before reaching it.
async fn wait_for(
    driver: &mut AsyncNotifier,
    document: &SharedDocument,
    target: &NotifierEvent,
) -> bool {
    while let Some(event) = driver.recv_event().await {
        report(document, &event);
        if &event == target {
            return true;
        }
        if matches!(event, NotifierEvent::Error(_)) {
            return false;
        }
    }
    false
}

fn report(document: &SharedDocument, event: &NotifierEvent) {
    let markup = document.lock().unwrap().to_markup();
    println!(
        "[{}] {event:?}",
        chrono::Local::now().format("%H:%M:%S%.3f")
    );
    println!("  {markup}");
}
