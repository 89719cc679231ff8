//! Development sandbox lifecycle.

#![allow(clippy::print_stdout)]

use std::time::Duration;

use glt_client::ClientState;
use glt_core::{SandboxDescriptor, SandboxStatus};

use crate::CliError;

pub async fn status(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().status().await?);
    Ok(())
}

pub async fn create(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().create().await?);
    Ok(())
}

pub async fn pause(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().pause().await?);
    Ok(())
}

pub async fn resume(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().resume().await?);
    Ok(())
}

pub async fn reset(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().reset().await?);
    Ok(())
}

pub async fn delete(state: &ClientState) -> Result<(), CliError> {
    print_descriptor(&state.sandbox().delete().await?);
    Ok(())
}

pub async fn wait(
    state: &ClientState,
    target: SandboxStatus,
    interval_secs: u64,
    max_polls: u32,
) -> Result<(), CliError> {
    let descriptor = state
        .sandbox()
        .wait_for_status(target, Duration::from_secs(interval_secs), max_polls)
        .await?;
    print_descriptor(&descriptor);
    Ok(())
}

fn print_descriptor(descriptor: &SandboxDescriptor) {
    println!("{} ({})", descriptor.container_name, descriptor.status);

    let urls = [
        ("Frontend", &descriptor.urls.frontend),
        ("Backend", &descriptor.urls.backend),
        ("Editor", &descriptor.urls.code_server),
    ];
    for (label, url) in urls {
        if let Some(url) = url {
            println!("  {label}: {url}");
        }
    }
}
