use crate::api::AppState;
use crate::config::Config;
use crate::database::Database;
use crate::models::{Role, User};
use crate::services::{
    FcmNotifier, LocationService, NoopNotifier, Notifier, PassService, ScanService, SosService,
    UserService,
};
use std::sync::Arc;

/// Creates the admin account on first boot when ADMIN_EMAIL is configured.
pub async fn initialize_admin(db: &Database, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(admin_email) = &config.admin_email else {
        tracing::debug!("ADMIN_EMAIL not set, skipping admin initialization");
        return Ok(());
    };

    if db.get_user_by_email(admin_email).await?.is_some() {
        return Ok(());
    }

    let admin = User::new(config.admin_name.clone(), admin_email.clone(), Role::Admin);
    db.create_user(&admin).await?;
    tracing::info!("Admin user created: {}", admin_email);

    Ok(())
}

/// Builds the application state with all services wired to the shared
/// database handle and the configured push transport.
pub async fn build_app_state(
    db: Database,
    config: &Config,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let notifier: Arc<dyn Notifier> = match &config.fcm_server_key {
        Some(key) => {
            tracing::info!("FCM push delivery enabled");
            Arc::new(FcmNotifier::new(key.clone()))
        }
        None => {
            tracing::info!("FCM_SERVER_KEY not set, push delivery disabled");
            Arc::new(NoopNotifier)
        }
    };

    let pass_service = PassService::new(db.clone(), notifier.clone());
    let scan_service = ScanService::new(db.clone(), notifier.clone());
    let user_service = UserService::new(db.clone());
    let sos_service = SosService::new(db.clone(), notifier.clone());
    let location_service = LocationService::new(db.clone(), notifier);

    Ok(AppState {
        db,
        pass_service,
        scan_service,
        user_service,
        sos_service,
        location_service,
    })
}
