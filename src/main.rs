use std::path::Path;
use std::process::ExitCode;

use orbscape::config::SceneConfig;
use orbscape::error::AppError;

/// `orbscape [config.json | seed]`
fn load_config() -> Result<SceneConfig, AppError> {
    match std::env::args().nth(1) {
        Some(arg) if arg.ends_with(".json") || Path::new(&arg).is_file() => Ok(SceneConfig::load(&arg)?),
        Some(seed) => Ok(SceneConfig {
            seed,
            ..SceneConfig::default()
        }),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let result = load_config().and_then(orbscape::window::run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("orbscape: {}", e);
            ExitCode::FAILURE
        }
    }
}
