use actix_files::Files;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{middleware, web::Data, App, HttpServer};
use log::info;

use cashmeister::{config::Config, db, load_templates, routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cfg = Config::from_env()?;
    let session_key = cfg.session_key()?;

    let state = AppState {
        db_pool: db::connect(&cfg.database_url).await?,
        templates: load_templates(&cfg.templates_dir)?,
    };

    info!("Starting HTTP server on http://{}:{}/", cfg.host, cfg.port);

    let static_dir = cfg.static_dir.clone();
    let secure_cookies = cfg.secure_cookies;
    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", &static_dir))
            .configure(routes::configure)
            .app_data(Data::new(state.clone()))
    })
    .bind((cfg.host.as_str(), cfg.port))?
    .run()
    .await
}
