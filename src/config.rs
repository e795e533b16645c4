// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use atty::{self, Stream};
use encoding_rs::Encoding;
use simple_error::SimpleError;
use snafu::ResultExt;
use structopt::StructOpt;
use tracing::debug;

use crate::error::{
  Error, OpenInput, ProfileDeserialize, ProfileRead, Result
};
use crate::parser::{EventFormat, TemporalAnchor, Zone};
use crate::profile::{self, FailurePolicy, ParsingProfile, ProfileDefinition};
use crate::renderer;

#[cfg(test)] use spectral::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RendererType {
  Auto,
  Plain,
  Raw,
  Json
}

impl RendererType {
  pub fn get_renderer(self) -> renderer::Renderer {
    match self {
      // pipes get json, terminals get something readable
      RendererType::Auto => if atty::is(Stream::Stdout) {
        renderer::plain_renderer
      } else {
        renderer::json_renderer
      },
      RendererType::Plain => renderer::plain_renderer,
      RendererType::Raw => renderer::raw_renderer,
      RendererType::Json => renderer::json_renderer
    }
  }
}

impl FromStr for RendererType {
  type Err = SimpleError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "auto" => Ok(RendererType::Auto),
      "plain" => Ok(RendererType::Plain),
      "raw" => Ok(RendererType::Raw),
      "json" => Ok(RendererType::Json),
      _ => Err(SimpleError::new(format!("invalid renderer type: {}", s)))
    }
  }
}

fn parse_encoding(label: &str) -> std::result::Result<&'static Encoding, SimpleError> {
  Encoding::for_label(label.trim().as_bytes())
    .ok_or_else(|| SimpleError::new(format!("unknown encoding: {}", label)))
}

/// User-defined profiles loaded from a YAML list of profile definitions
#[derive(Debug, Clone)]
pub struct ProfilesConfig {
  pub profiles: Vec<ParsingProfile>
}

impl ProfilesConfig {
  pub fn from_reader<R: Read>(path: &Path, reader: R) -> Result<ProfilesConfig> {
    let definitions: Vec<ProfileDefinition> = serde_yaml::from_reader(reader)
      .context(ProfileDeserialize { path })?;

    let profiles = definitions.iter()
      .map(|def| ParsingProfile::from_definition(def, false))
      .collect::<Result<Vec<_>>>()?;

    debug!(path = %path.display(), count = profiles.len(), "loaded parsing profiles");

    Ok(ProfilesConfig { profiles })
  }

  pub fn load(path: &Path) -> Result<ProfilesConfig> {
    let file = File::open(path).context(ProfileRead { path })?;

    ProfilesConfig::from_reader(path, BufReader::new(file))
  }

  pub fn get(&self, id: &str) -> Option<&ParsingProfile> {
    self.profiles.iter().find(|p| p.id() == id)
  }
}

impl FromStr for ProfilesConfig {
  type Err = SimpleError;

  fn from_str(path: &str) -> std::result::Result<Self, Self::Err> {
    let expanded_path = shellexpand::full(path).map_err(SimpleError::from)?;

    ProfilesConfig::load(Path::new(expanded_path.as_ref())).map_err(SimpleError::from)
  }
}

#[derive(Debug, StructOpt)]
#[structopt(
  name = "logsift",
  rename_all = "kebab-case",
  setting = structopt::clap::AppSettings::ColoredHelp
)]
pub struct Config {
  /// Renderer to use, one of: auto, plain, json, raw
  ///
  /// If auto, plain output is used on a terminal and json otherwise.
  #[structopt(long, short, default_value = "auto", env = "LS_RENDERER")]
  pub renderer: RendererType,

  /// Id of the parsing profile to use
  ///
  /// Built-in ids are ALL, ISO, ISO_STRICT, SYSLOG and JVM_UNIFIED; ids from
  /// --profiles are checked first.
  #[structopt(long, short, default_value = "ISO", env = "LS_PROFILE")]
  pub profile: String,

  /// A path to a YAML file containing a list of custom parsing profiles
  #[structopt(long, env = "LS_PROFILES")]
  pub profiles: Option<ProfilesConfig>,

  /// Character encoding of the input, as a WHATWG label
  #[structopt(
    long, short,
    default_value = "utf-8",
    env = "LS_ENCODING",
    parse(try_from_str = parse_encoding)
  )]
  pub encoding: &'static Encoding,

  /// Time zone of captured local times, e.g. UTC, Europe/Paris or +02:00
  #[structopt(long, short, default_value = "UTC", env = "LS_ZONE")]
  pub zone: Zone,

  /// Supplies the date and time fields a profile doesn't capture
  ///
  /// One of: epoch, today, now, or a date-time such as 2020-01-01T00:00:00
  #[structopt(long, short, default_value = "today", env = "LS_ANCHOR")]
  pub anchor: TemporalAnchor,

  /// Overrides the profile's failure policy, one of: concat, ignore, abort
  #[structopt(long, env = "LS_ON_FAILURE")]
  pub on_failure: Option<FailurePolicy>,

  /// Print the available parsing profiles and exit
  #[structopt(long)]
  pub list_profiles: bool,

  /// File to read; standard input if unset
  #[structopt(parse(from_os_str))]
  pub input: Option<PathBuf>
}

impl Config {
  /// Every selectable profile, custom profiles first
  pub fn available_profiles(&self) -> Vec<&ParsingProfile> {
    let custom = self.profiles.iter().flat_map(|p| p.profiles.iter());

    custom.chain(profile::catalog().iter()).collect()
  }

  /// Resolves --profile, applying any --on-failure override
  pub fn resolve_profile(&self) -> Result<ParsingProfile> {
    let custom = self.profiles.as_ref().and_then(|p| p.get(&self.profile));

    let selected = match custom.or_else(|| profile::by_id(&self.profile)) {
      Some(selected) => selected,
      None => return Err(Error::UnknownProfile { id: self.profile.clone() })
    };

    match self.on_failure {
      Some(policy) if policy != selected.failure_policy() => {
        let mut edited = selected.to_editable();
        if let Some(content) = edited.as_editable_mut() {
          content.set_failure_policy(policy);
        }

        edited.to_frozen()
      },
      _ => Ok(selected.clone())
    }
  }

  pub fn event_format(&self) -> Result<EventFormat> {
    Ok(EventFormat::new(
      self.resolve_profile()?,
      self.zone,
      self.encoding,
      self.anchor
    ))
  }

  pub fn open_input(&self) -> Result<Box<dyn Read + Send>> {
    match &self.input {
      Some(path) => {
        let file = File::open(path).context(OpenInput { path })?;

        Ok(Box::new(file))
      },
      None => Ok(Box::new(io::stdin()))
    }
  }
}
