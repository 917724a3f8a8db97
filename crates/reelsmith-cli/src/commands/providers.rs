//! Provider listing

use super::Context;
use anyhow::Result;
use reelsmith_gen::providers::{available_providers, create_provider};
use reelsmith_gen::MediaKind;

pub fn run(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;

    println!("Providers:");
    for name in available_providers() {
        let status = match create_provider(name, &config) {
            Ok(provider) => {
                let kinds: Vec<String> = provider.supported_kinds().iter().map(|k| k.to_string()).collect();
                let health = provider
                    .health_check()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|e| e.to_string());
                format!("{} [{}]", health, kinds.join(", "))
            }
            Err(e) => e.to_string(),
        };
        let enabled = if config.is_enabled(name) { "" } else { " (disabled)" };
        println!("  {:<12} {}{}", name, status, enabled);
    }

    println!();
    println!("Routing:");
    for kind in MediaKind::ALL {
        let name = ctx
            .provider
            .as_deref()
            .unwrap_or_else(|| config.default_provider(kind));
        println!("  {:<12} -> {}", kind.to_string(), name);
    }
    Ok(())
}
