#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use stun_probe::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    simple_logger::init_with_level(config.log_level)?;

    stun_probe::startup(config).await
}
