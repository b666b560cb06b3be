use async_std::task;
use wirehttp::config::ServerConfig;
use wirehttp::handler::AppHandler;
use wirehttp::net::server;

fn main() -> std::io::Result<()> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(&path),
        None => ServerConfig::default(),
    };

    task::block_on(async {
        let server = server::serve(&config, AppHandler::new(&config)).await?;
        server.wait().await;
        Ok(())
    })
}

fn init_logging() {
    let configured = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {message}",
                record.level(),
                record.target()
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply();
    if let Err(err) = configured {
        eprintln!("failed to initialize logging: {err}");
    }
}
