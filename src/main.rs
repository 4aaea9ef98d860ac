use anyhow::Result;
use dotenv::dotenv;

use grindbot::{bot, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    dotenv().ok();
    let config = Config::from_env()?;

    // Initialize database
    db::set_db_path(&config.db_path);
    db::initialize_db()?;

    if let Err(why) = bot::run(config).await {
        log::error!("Client error: {why:?}");
    }

    Ok(())
}
