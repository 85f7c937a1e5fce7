use std::{
  fs,
  io::{
    self,
    Read,
  },
};

use anyhow::{
  Context,
  Result,
};
use smartype_lib::settings::Settings;
use tracing_subscriber::EnvFilter;

use crate::{
  cli::CliOptions,
  script::Replay,
};

mod cli;
mod script;

fn main() -> Result<()> {
  let options = CliOptions::parse()?;
  setup_logging(options.verbosity);

  let settings = match &options.config_file {
    Some(path) => {
      let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
      Settings::from_toml(&source).with_context(|| format!("invalid settings in {}", path.display()))?
    },
    None => Settings::default(),
  };

  let script = match options.script {
    Some(script) => script,
    None => {
      let mut script = String::new();
      io::stdin()
        .read_to_string(&mut script)
        .context("failed to read keys from stdin")?;
      script.trim_end_matches(['\n', '\r']).to_string()
    },
  };

  let mut replay = Replay::new(settings, &options.text, options.syntax);
  for key in script::parse(&script)? {
    replay.press(&key)?;
  }

  if options.show_cursor {
    println!("{}", replay.text_with_cursors());
  } else {
    println!("{}", replay.text());
  }
  Ok(())
}

fn setup_logging(verbosity: u8) {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();
}
