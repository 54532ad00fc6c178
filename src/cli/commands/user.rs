//! User management command handlers

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, RegisterRequest, SeaOrmAuthService};

pub async fn cmd_user_add(
    config: &Config,
    username: &str,
    email: &str,
    identification: &str,
) -> anyhow::Result<()> {
    println!("Password for {username}:");
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']).to_string();

    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    let request = RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        identification: identification.to_string(),
        confirm_password: password.clone(),
        password,
    };

    match auth.register(&request).await {
        Ok(user) => {
            println!("✓ Created user {} (ID: {})", user.username, user.id);
            Ok(())
        }
        Err(AuthError::Validation(errors)) => {
            println!("Could not create user:");
            for (field, message) in errors {
                println!("  {field}: {message}");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
