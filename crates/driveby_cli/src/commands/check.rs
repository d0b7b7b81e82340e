use anyhow::Result;
use colored::*;

use crate::commands;
use crate::output;

pub async fn execute(contract_path: &str) -> Result<()> {
    let loaded = commands::load(contract_path).await?;
    let model = &loaded.model;

    output::print_info(&format!(
        "Contract loaded: {} v{} (OpenAPI {})",
        model.info.title, model.info.version, model.openapi
    ));
    output::print_success("Contract structure is valid");

    println!("\nContract Summary:");
    println!("  Title:       {}", model.info.title);
    println!("  Version:     {}", model.info.version);
    println!(
        "  Description: {}",
        model.info.description.as_deref().unwrap_or("N/A")
    );
    println!("  Source:      {}", model.source);
    println!("  Paths:       {}", model.paths.len());
    println!("  Operations:  {}", model.operation_count());

    if !model.servers.is_empty() {
        println!("\nServers:");
        for server in &model.servers {
            println!("  {}", server);
        }
    }

    if !model.security_schemes.is_empty() {
        let names: Vec<&str> = model.security_schemes.keys().map(String::as_str).collect();
        println!("\nSecurity Schemes: {}", names.join(", "));
    }

    println!("\nEndpoints:");
    for operation in model.operations() {
        let label = format!("{:<7} {}", operation.method.to_string(), operation.path);
        if operation.deprecated {
            println!("  {} {}", label.dimmed(), "(deprecated)".yellow());
        } else {
            println!("  {}", label);
        }
    }

    if !loaded.notes.is_empty() {
        println!("\nNormalization:");
        for note in &loaded.notes {
            println!("  - {}", note);
        }
    }

    Ok(())
}
