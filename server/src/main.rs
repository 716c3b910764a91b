use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use warp::Filter;

use backend::config::{get_variable, get_variable_or};
use backend::db::PgDb;
use backend::environment::{Config, Environment};
use backend::routes;
use backend::urls::Urls;
use futures::future::FutureExt;
use log::{info, initialize_logger};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("BACKEND_PORT")
        .parse()
        .expect("parse BACKEND_PORT as u16");
    let admin_port: u16 = get_variable("BACKEND_ADMIN_PORT")
        .parse()
        .expect("parse BACKEND_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("BACKEND_DB_CONNECTION_STRING");
    let max_connections: u32 = get_variable_or("BACKEND_DB_MAX_CONNECTIONS", "5")
        .parse()
        .expect("parse BACKEND_DB_MAX_CONNECTIONS as u32");
    let connect_timeout: u64 = get_variable_or("BACKEND_DB_CONNECT_TIMEOUT_SECONDS", "5")
        .parse()
        .expect("parse BACKEND_DB_CONNECT_TIMEOUT_SECONDS as u64");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(connect_timeout))
        .connect(&connection_string)
        .await
        .expect("create database pool from BACKEND_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let urls = Arc::new(Urls::new(
        get_variable("BACKEND_BASE_URL"),
        get_variable_or("BACKEND_API_PATH", "api"),
    ));

    let config = Config::new(
        get_variable_or("BACKEND_RECENT_DETECTIONS_LIMIT", "10")
            .parse()
            .expect("parse BACKEND_RECENT_DETECTIONS_LIMIT as i64"),
    );
    let environment = Environment::new(logger.clone(), db, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            termination_sender.send(()).await.unwrap();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let register_route = routes::make_register_route(environment.clone());
        let login_route = routes::make_login_route(environment.clone());
        let bins_list_route = routes::make_bins_list_route(environment.clone());
        let bin_retrieve_route = routes::make_bin_retrieve_route(environment.clone());
        let bin_create_route = routes::make_bin_create_route(environment.clone());
        let bin_update_route = routes::make_bin_update_route(environment.clone());
        let bin_delete_route = routes::make_bin_delete_route(environment.clone());
        let user_retrieve_route = routes::make_user_retrieve_route(environment.clone());
        let recycle_route = routes::make_recycle_route(environment.clone());
        let detections_route = routes::make_detections_route(environment.clone());

        let routes = register_route
            .or(login_route)
            .or(bins_list_route)
            .or(bin_create_route)
            .or(bin_retrieve_route)
            .or(bin_update_route)
            .or(bin_delete_route)
            .or(user_retrieve_route)
            .or(recycle_route)
            .or(detections_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
