// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use regex::Regex;
use snafu::ResultExt;
use tracing::debug;

use crate::capture::NamedCaptureGroup;
use crate::error::{Error, InvalidPattern, Result};

#[cfg(test)] use spectral::prelude::*;

lazy_static! {
  static ref GROUP_TAG: Regex = Regex::new(r"\$[A-Za-z0-9]{2,}").unwrap();
}

/// A `$` preceded by an odd run of backslashes is a literal dollar sign
fn is_escaped(template: &str, start: usize) -> bool {
  let backslashes = template[..start]
    .chars()
    .rev()
    .take_while(|c| *c == '\\')
    .count();

  backslashes % 2 == 1
}

fn find_group<'a>(
  groups: &'a [(NamedCaptureGroup, String)], token: &str
) -> Option<&'a (NamedCaptureGroup, String)> {
  groups.iter().find(|(group, _)| group.matches_token(token))
}

/// Substitutes each `$TOKEN` in `template` with a named group wrapping the
/// token's expression. Substitution is a single pass, so expressions that
/// themselves contain `$TOKEN`-like text are left alone.
pub fn build_pattern_string(
  profile: &str,
  groups: &[(NamedCaptureGroup, String)],
  template: &str
) -> Result<String> {
  let mut pattern = String::with_capacity(template.len() * 2);
  let mut last = 0;

  for tag in GROUP_TAG.find_iter(template) {
    if is_escaped(template, tag.start()) {
      continue;
    }

    let (group, expression) = match find_group(groups, tag.as_str()) {
      Some(found) => found,
      None => return Err(Error::UnknownCaptureGroup {
        profile: profile.to_string(),
        token: tag.as_str().to_string()
      })
    };

    pattern.push_str(&template[last..tag.start()]);
    pattern.push_str(&format!("(?P<{}>{})", group.name(), expression));
    last = tag.end();
  }

  pattern.push_str(&template[last..]);

  Ok(pattern)
}

pub fn compile(
  profile: &str,
  groups: &[(NamedCaptureGroup, String)],
  template: &str
) -> Result<Regex> {
  let pattern = build_pattern_string(profile, groups, template)?;
  debug!(profile = profile, pattern = %pattern, "compiling parsing pattern");

  Regex::new(&pattern).context(InvalidPattern { profile })
}
