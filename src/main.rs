use anyhow::Context;

use ribbon::App;

#[cfg(feature = "tracing")]
use tracing_subscriber::prelude::*;

fn main() -> anyhow::Result<()> {
    log4rs::init_file("log4rs.yml", Default::default()).context("Could not configure logger")?;

    #[cfg(feature = "tracing")]
    tracing_subscriber::registry()
        .with(tracing_tracy::TracyLayer::new())
        .init();

    let app = App::new().context("Failed to create App")?;

    app.run()
}
