use std::sync::Arc;

use log::error;
use timetable_solver::config::SchedulerConfig;
use timetable_solver::jobs::{LogPublisher, SchedulerService};
use timetable_solver::server;

#[tokio::main]
async fn main() {
    let config = match SchedulerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    let service = Arc::new(SchedulerService::new(
        config.solver.clone(),
        Arc::new(LogPublisher),
    ));

    if let Err(e) = server::run_server(&config, service).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
