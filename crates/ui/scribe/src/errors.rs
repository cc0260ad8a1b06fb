use std::sync::OnceLock;

use color_eyre::Result;
use tracing::error;

static INIT: OnceLock<()> = OnceLock::new();

pub fn init() -> Result<()> {
    // idempotent: wenn schon initialisiert, tue nichts
    if INIT.get().is_some() {
        return Ok(());
    }

    let hooks = color_eyre::config::HookBuilder::default()
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;

    let (panic_hook, eyre_hook) = hooks;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        // Raw mode und Alternate Screen zuerst zurücksetzen, sonst ist die Meldung unlesbar
        if let Err(r) = crate::tui::restore() {
            error!("Unable to exit Terminal: {:?}", r);
        }
        let report = panic_hook.panic_report(panic_info);
        error!("Error: {}", report);
        eprintln!("{}", report);
        // Kein process::exit: main wird abgewickelt und der Log-Guard flusht dabei.
    }));

    // Markiere als initialisiert
    let _ = INIT.set(());

    Ok(())
}
