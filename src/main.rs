use std::env;
use std::path::Path;

use dlens::client::shell;
use dlens::{Config, Explorer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut explorer = Explorer::new(&config);
    if let Some(path) = env::args().nth(1) {
        shell::open_file(&mut explorer, Path::new(&path)).await?;
    }

    shell::run(&mut explorer).await?;
    Ok(())
}
