//! Rendering of server records, probe results and batch reports.

use mcpreg_core::{
    BatchReport, ProbeResult, ServerDefinition, ServerRecord, ServerStatus, StepStatus,
    TransportKind,
};

use super::tables::{format_optional, print_separator, truncate_string};

/// One-line description of what a server runs or connects to.
pub fn server_target(config: &ServerDefinition) -> String {
    match config.transport {
        TransportKind::Stdio => {
            let mut parts = vec![config.command.clone().unwrap_or_default()];
            parts.extend(config.args.iter().cloned());
            parts.join(" ")
        }
        TransportKind::Http | TransportKind::Sse => config.url.clone().unwrap_or_default(),
    }
}

pub const fn status_label(status: ServerStatus) -> &'static str {
    match status {
        ServerStatus::Unknown => "unknown",
        ServerStatus::Testing => "testing",
        ServerStatus::Connected => "connected",
        ServerStatus::Failed => "failed",
    }
}

const fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Success => "✓",
        StepStatus::Error => "✗",
        StepStatus::Pending => "…",
    }
}

pub fn print_record_table(records: &[ServerRecord]) {
    println!("{:<24} {:<6} {:<10} Target", "Name", "Type", "Status");
    print_separator(90);
    for record in records {
        println!(
            "{:<24} {:<6} {:<10} {}",
            truncate_string(&record.name, 23),
            record.config.transport.as_str(),
            status_label(record.status),
            truncate_string(&server_target(&record.config), 48)
        );
    }
}

pub fn print_record_detail(record: &ServerRecord) {
    let config = &record.config;
    println!("Name:       {}", record.name);
    println!("Transport:  {}", config.transport);
    println!("Status:     {}", status_label(record.status));
    match config.transport {
        TransportKind::Stdio => {
            println!("Command:    {}", server_target(config));
            println!(
                "Directory:  {}",
                format_optional(config.working_directory.as_ref(), "(inherited)")
            );
            for key in config.env.keys() {
                println!("Env:        {key}=…");
            }
        }
        TransportKind::Http | TransportKind::Sse => {
            println!("URL:        {}", format_optional(config.url.as_ref(), "--"));
            for key in config.headers.keys() {
                println!("Header:     {key}: …");
            }
        }
    }
    if let Some(at) = record.last_probed_at {
        println!("Probed at:  {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(error) = &record.last_error {
        println!("Last error: {error}");
    }
}

pub fn print_probe_result(name: &str, result: &ProbeResult) {
    for step in &result.steps {
        println!("  {} {}: {}", step_marker(step.status), step.name, step.message);
        if let Some(details) = &step.details {
            for line in details.lines() {
                println!("      {line}");
            }
        }
    }
    if result.success {
        let latency = format_optional(result.latency_ms.as_ref(), "?");
        match &result.server {
            Some(server) => println!(
                "{name}: connected in {latency}ms ({} {})",
                server.name,
                server.version.as_deref().unwrap_or("")
            ),
            None => println!("{name}: connected in {latency}ms"),
        }
    } else {
        println!(
            "{name}: failed ({})",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub fn print_batch_report(report: &BatchReport) {
    println!("{:<24} {:<10} {:<9} Detail", "Name", "Result", "Latency");
    print_separator(90);
    for (name, result) in &report.results {
        let (label, detail) = if result.success {
            ("connected", String::new())
        } else {
            ("failed", result.error.clone().unwrap_or_default())
        };
        let latency = result
            .latency_ms
            .map_or_else(|| "--".to_string(), |ms| format!("{ms}ms"));
        println!(
            "{:<24} {:<10} {:<9} {}",
            truncate_string(name, 23),
            label,
            latency,
            truncate_string(&detail, 44)
        );
    }
    println!();
    println!(
        "{} servers: {} connected, {} failed",
        report.summary.total, report.summary.connected, report.summary.failed
    );
}
