use anyhow::Context;
use env_logger::Env;
use punch::{configuration::get_configuration, console, startup::run};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let result = match get_configuration().context("Failed to read configuration.") {
        Ok(configuration) => run(configuration).await,
        Err(e) => Err(e),
    };

    // Reported here only, so the error is printed once
    if let Err(e) = result {
        console::error(&console::fatal_message(&e));
        std::process::exit(1);
    }
}
