//! Login, logout, registration and account information.

#![allow(clippy::print_stdout)]

use glt_client::ClientState;
use glt_client::services::account::Registration;

use super::prompt;
use crate::CliError;

async fn password_or_prompt(password: Option<String>) -> Result<String, CliError> {
    match password {
        Some(password) => Ok(password),
        None => Ok(prompt("Password: ").await?.unwrap_or_default()),
    }
}

pub async fn login(
    state: &ClientState,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = password_or_prompt(password).await?;
    state.session().login(email, &password).await?;
    println!("Logged in as {email}");
    Ok(())
}

pub async fn logout(state: &ClientState) {
    state.session().logout().await;
    println!("Logged out");
}

pub async fn register(
    state: &ClientState,
    email: String,
    name: String,
    grade: String,
    school: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = password_or_prompt(password).await?;
    let form = Registration {
        email,
        name,
        grade,
        school,
        password: password.into(),
    };
    state.account().register(form).await?;
    println!("Account created. Log in with `glt login`.");
    Ok(())
}

pub async fn schools(state: &ClientState) -> Result<(), CliError> {
    for school in state.account().schools().await? {
        println!("{school}");
    }
    Ok(())
}

pub async fn profile(state: &ClientState) -> Result<(), CliError> {
    let profile = state.account().profile().await?;
    println!("{} <{}>", profile.name, profile.email);
    if let Some(school) = &profile.school {
        println!("School: {school}");
    }
    if let Some(grade) = &profile.grade {
        println!("Grade:  {grade}");
    }
    Ok(())
}

pub async fn dashboard(state: &ClientState) -> Result<(), CliError> {
    let dashboard = state.account().dashboard().await?;

    println!("Chats: {}", dashboard.chat_count);

    println!("Badges:");
    for badge in dashboard.earned_badges() {
        println!("  * {} - {}", badge.name, badge.description);
    }

    println!("Orders:");
    for order in &dashboard.orders {
        let total = order
            .total
            .map_or_else(|| "-".to_string(), |total| total.to_string());
        let status = order.status.as_deref().unwrap_or("unknown");
        println!("  #{} {status} {total}", order.id);
    }
    Ok(())
}
