use anyhow::Result;
use std::io::Read;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use seltrans::{
    logger, Background, Config, ConfigStore, JsonFileStore, LocalHost, LogNotifier, MemoryPage,
    MemoryStore, PageSurface,
};

/// Demo driver: puts the given text (arguments, or stdin when none) on a
/// simulated page as the selection, fires one trigger against the
/// configured Ollama server, and prints what the page ended up showing.
#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    let text = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.is_empty() {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            args.join(" ")
        }
    };

    // Config comes from config.json next to the exe; env vars override.
    let mut cfg: Config = JsonFileStore::new().load();
    if let Ok(v) = std::env::var("SELTRANS_ENDPOINT") {
        if !v.is_empty() {
            cfg.endpoint = v;
        }
    }
    if let Ok(v) = std::env::var("SELTRANS_MODEL") {
        if !v.is_empty() {
            cfg.model = v;
        }
    }
    tracing::info!(endpoint = %cfg.endpoint, model = %cfg.model, "config loaded");

    let (bg_tx, bg_rx) = mpsc::unbounded_channel();
    let host = Arc::new(LocalHost::new(bg_tx));
    let background = Background::new(host.clone(), MemoryStore::new(cfg), LogNotifier);
    background.spawn_dispatcher(bg_rx);

    let page = Arc::new(Mutex::new(MemoryPage::with_selection(&text)));
    let surface: Arc<Mutex<dyn PageSurface>> = page.clone();
    let tab = host.open_tab("https://example.com/", surface);

    background.handle_trigger(tab).await;

    let page = page.lock().unwrap();
    match &page.result {
        Some(shown) => println!("{shown}"),
        None => anyhow::bail!("no translation was produced; see the log for the notice"),
    }
    Ok(())
}
