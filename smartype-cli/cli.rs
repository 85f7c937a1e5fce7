use std::path::PathBuf;

use anyhow::Result;
use clap::{
  ArgAction,
  Parser,
  ValueEnum,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub config_file: Option<PathBuf>,
  pub text:        String,
  pub syntax:      SyntaxMode,
  pub show_cursor: bool,
  pub script:      Option<String>,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SyntaxMode {
  #[default]
  Markdown,
  Plain,
}

#[derive(Parser, Debug)]
#[command(name = "smartype", about, long_about = None, version)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count)]
  verbosity: u8,

  /// Load settings from a TOML file
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  config_file: Option<PathBuf>,

  /// Initial document contents; the cursor starts at the end
  #[arg(short = 't', long = "text", value_name = "TEXT", default_value = "")]
  text: String,

  /// How to find code, math and template regions
  #[arg(long = "syntax", value_enum, default_value_t = SyntaxMode::Markdown)]
  syntax: SyntaxMode,

  /// Mark cursors with `|` in the output
  #[arg(long = "show-cursor")]
  show_cursor: bool,

  /// Keystrokes to replay. `<bs>` is a backspace, `<left>`/`<right>` move
  /// the cursor, `<dq>`/`<sq>` type an auto-paired quote pair and `<lt>` a
  /// literal `<`. Read from stdin when omitted.
  #[arg(value_name = "KEYS")]
  script: Option<String>,
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    Ok(Self {
      verbosity:   raw.verbosity,
      config_file: raw.config_file,
      text:        raw.text,
      syntax:      raw.syntax,
      show_cursor: raw.show_cursor,
      script:      raw.script.filter(|script| script != "-"),
    })
  }
}
