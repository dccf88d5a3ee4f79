use owo_colors::OwoColorize;

use crate::pod::PodIdentity;

const LLAMA: &str = "🦙";

/// Print a startup banner
pub fn startup_banner(listen_addr: &str) {
    println!();
    println!("{}", "═".repeat(50).bright_cyan());
    println!(
        "{}  {} {}",
        LLAMA,
        "OLLAMA GATEWAY".bright_cyan().bold(),
        format!("- {}", listen_addr).bright_white()
    );
    println!("{}", "═".repeat(50).bright_cyan());
    println!();
}

/// Print configuration info
pub fn config_item(key: &str, value: &str) {
    println!(
        "{} {} {}",
        LLAMA,
        format!("{}:", key).bright_white(),
        value.bright_cyan()
    );
}

/// Print where the orchestrator placed us
pub fn pod_identity(identity: &PodIdentity) {
    config_item("Pod", &identity.pod_name);
    config_item("Pod IP", &identity.pod_ip);
    config_item("Node", &identity.node_name);
}
