//! Shared output helpers

use owo_colors::OwoColorize;
use replicator_core::ReplicationTarget;

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Lines describing what will be replicated where
pub fn describe_target(target: &ReplicationTarget) -> Vec<String> {
    let mut lines = vec![
        format!("Identity:     {}", target.identity_home().display()),
        format!("Source:       {}", target.source_path().display()),
        format!("Destination:  {}", target.destination_path()),
        format!("Remote:       {}", target.endpoint()),
        format!("Min interval: {} ms", target.min_interval().as_millis()),
    ];
    if target.destination_defaulted() {
        lines.push(format!(
            "Target_Filename not set, using source filename {}",
            target.destination_name()
        ));
    }
    lines
}

/// Print the startup summary
pub fn print_target(target: &ReplicationTarget) {
    println!("{}", "File replicator".bold());
    for line in describe_target(target) {
        println!("  {}", line);
    }
    println!();
}
