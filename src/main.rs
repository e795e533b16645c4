// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::error::Error;
use std::process;
use std::sync::mpsc::channel;

use structopt::StructOpt;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter, prelude::*};

use logsift::config::Config;
use logsift::reader::spawn_reader;

fn init_logging() {
  let filter = EnvFilter::try_from_env("LS_LOG")
    .unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn list_profiles(config: &Config) {
  for profile in config.available_profiles() {
    println!("{:<12} {:<30} {}", profile.id(), profile.name(), profile.line_template());
  }
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
  let format = config.event_format()?;
  let input = config.open_input()?;

  debug!(
    profile = format.profile().id(),
    anchor = %format.anchor(),
    "parsing input"
  );

  let (entry_tx, entry_rx) = channel();
  let renderer = config.renderer.get_renderer()(entry_rx)?;
  let reader = spawn_reader(format, input, entry_tx)?;

  let result = reader.join().map_err(|_| "reader thread did not exit cleanly")?;
  renderer.join().map_err(|_| "renderer thread did not exit cleanly")?;

  result?;

  Ok(())
}

fn main() {
  init_logging();

  let config = Config::from_args();

  if config.list_profiles {
    list_profiles(&config);
    return;
  }

  if let Err(e) = run(&config) {
    eprintln!("error: {}", e);

    let code = e.downcast_ref::<logsift::Error>().map_or(1, logsift::Error::exit_code);
    process::exit(code);
  }
}
