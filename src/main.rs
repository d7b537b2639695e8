use rust_manga_reader::config::Config;
use rust_manga_reader::gateway::LogNavigator;
use rust_manga_reader::{logging, Navigation, Portal};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let cfg = Config::load();
    let portal = match Portal::new(cfg, Arc::new(LogNavigator)) {
        Ok(portal) => portal,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let user = match portal.session().stored_user() {
        Ok(Some(user)) => format!("{} ({})", user.username, user.role),
        Ok(None) => "guest".to_string(),
        Err(e) => {
            log::warn!("Stored session unreadable: {}", e);
            "guest".to_string()
        }
    };
    log::info!("Signed in as {}, theme {}", user, portal.theme().current().as_str());

    let paths: Vec<String> = std::env::args().skip(1).collect();
    let paths = if paths.is_empty() {
        vec!["/".to_string()]
    } else {
        paths
    };

    for path in paths {
        match portal.navigate(&path) {
            Navigation::Render {
                route,
                params,
                chrome,
            } => println!("{} -> {} {:?} with {:?} chrome", path, route, params, chrome),
            Navigation::Redirect { to, .. } => println!("{} -> redirect {}", path, to),
            Navigation::NotFound { chrome } => println!("{} -> not found ({:?} chrome)", path, chrome),
        }
    }

    let spec = portal.layout().load().await;
    log::debug!("Chrome {:?} has {} nav items", spec.chrome, spec.nav.len());
}
