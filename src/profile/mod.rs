// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use regex::Regex;

use crate::capture::NamedCaptureGroup;
use crate::error::{Error, Result};

mod builtin;
mod template;
mod types;

pub use builtin::{by_id, catalog, BuiltInProfile};
pub use template::build_pattern_string;
pub use types::{
  new_profile_id, CaptureGroupDefinition, FailurePolicy, ProfileDefinition
};

#[cfg(test)] use spectral::prelude::*;

/// Keeps one entry per group name; a later entry replaces the expression of
/// an earlier one in place
fn dedupe_groups(
  groups: Vec<(NamedCaptureGroup, String)>
) -> Vec<(NamedCaptureGroup, String)> {
  let mut deduped: Vec<(NamedCaptureGroup, String)> = Vec::with_capacity(groups.len());

  for (group, expression) in groups {
    match deduped.iter_mut().find(|(g, _)| *g == group) {
      Some(existing) => *existing = (group, expression),
      None => deduped.push((group, expression))
    }
  }

  deduped
}

fn default_labels(groups: &[(NamedCaptureGroup, String)]) -> Vec<String> {
  groups.iter().map(|(group, _)| group.name().to_string()).collect()
}

/// The user-visible parts of a profile
#[derive(Debug, Clone)]
pub struct ProfileContent {
  id: String,
  name: String,
  capture_groups: Vec<(NamedCaptureGroup, String)>,

  /// each group's name as written, in step with `capture_groups`
  group_labels: Vec<String>,

  line_template: String,
  failure_policy: FailurePolicy
}

impl ProfileContent {
  fn new(
    id: String,
    name: String,
    capture_groups: Vec<(NamedCaptureGroup, String)>,
    line_template: String,
    failure_policy: FailurePolicy
  ) -> ProfileContent {
    let capture_groups = dedupe_groups(capture_groups);
    let group_labels = default_labels(&capture_groups);

    ProfileContent {
      id, name,
      capture_groups, group_labels,
      line_template, failure_policy
    }
  }

  pub fn set_name(&mut self, name: &str) {
    self.name = name.to_string();
  }

  pub fn set_line_template(&mut self, template: &str) {
    self.line_template = template.to_string();
  }

  pub fn set_capture_groups(&mut self, groups: Vec<(NamedCaptureGroup, String)>) {
    self.capture_groups = dedupe_groups(groups);
    self.group_labels = default_labels(&self.capture_groups);
  }

  /// Adds a group, or replaces the expression of an existing group with the
  /// same name. A replaced group keeps the name it was written with.
  pub fn insert_capture_group(&mut self, group: NamedCaptureGroup, expression: &str) {
    match self.capture_groups.iter_mut().find(|(g, _)| *g == group) {
      Some(existing) => existing.1 = expression.to_string(),
      None => {
        self.group_labels.push(group.name().to_string());
        self.capture_groups.push((group, expression.to_string()));
      }
    }
  }

  pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
    self.failure_policy = policy;
  }

  fn compile(&self) -> Result<Regex> {
    template::compile(&self.id, &self.capture_groups, &self.line_template)
  }
}

/// A profile whose pattern was compiled once, at construction
#[derive(Debug)]
pub struct FrozenProfile {
  content: ProfileContent,
  pattern: Regex
}

/// A named recipe for turning log lines into events.
///
/// Frozen profiles are immutable and cheap to clone; editable profiles can be
/// changed in place and recompile their pattern every time it is requested.
/// Two profiles are equal when their ids are, whatever their content.
#[derive(Debug, Clone)]
pub enum ParsingProfile {
  Frozen(Arc<FrozenProfile>),
  Editable(ProfileContent)
}

impl ParsingProfile {
  /// Builds a frozen profile, failing if its template does not compile
  pub fn frozen(
    id: &str,
    name: &str,
    groups: Vec<(NamedCaptureGroup, String)>,
    line_template: &str,
    policy: FailurePolicy
  ) -> Result<ParsingProfile> {
    let content = ProfileContent::new(
      id.to_string(), name.to_string(), groups, line_template.to_string(), policy
    );

    ParsingProfile::freeze(content)
  }

  fn freeze(content: ProfileContent) -> Result<ParsingProfile> {
    let pattern = content.compile()?;

    Ok(ParsingProfile::Frozen(Arc::new(FrozenProfile { content, pattern })))
  }

  /// Builds an editable profile with a fresh id. The template is not checked
  /// until a pattern is requested.
  pub fn editable(
    name: &str,
    groups: Vec<(NamedCaptureGroup, String)>,
    line_template: &str,
    policy: FailurePolicy
  ) -> ParsingProfile {
    ParsingProfile::Editable(ProfileContent::new(
      new_profile_id(), name.to_string(), groups, line_template.to_string(), policy
    ))
  }

  pub fn empty() -> ParsingProfile {
    ParsingProfile::editable("New profile", Vec::new(), "", FailurePolicy::default())
  }

  /// An editable duplicate of `profile` with a fresh id
  pub fn copy_of(profile: &ParsingProfile) -> ParsingProfile {
    let mut content = profile.content().clone();
    content.id = new_profile_id();
    content.name = format!("Copy of {}", content.name);

    ParsingProfile::Editable(content)
  }

  /// An editable duplicate that keeps this profile's id
  pub fn to_editable(&self) -> ParsingProfile {
    ParsingProfile::Editable(self.content().clone())
  }

  /// Freezes the current content, compiling the pattern
  pub fn to_frozen(&self) -> Result<ParsingProfile> {
    match self {
      ParsingProfile::Frozen(_) => Ok(self.clone()),
      ParsingProfile::Editable(content) => ParsingProfile::freeze(content.clone())
    }
  }

  /// Builds a profile from its exchange form. Group names are kept as
  /// written, and two groups that resolve to the same name (`msg` and `Msg`,
  /// or `MILLI` and `FRACTION`) are an error.
  pub fn from_definition(
    definition: &ProfileDefinition, editable: bool
  ) -> Result<ParsingProfile> {
    let mut capture_groups: Vec<(NamedCaptureGroup, String)> = Vec::new();
    let mut group_labels: Vec<String> = Vec::new();

    for group_def in &definition.capture_groups {
      let (group, expression) = group_def.to_group()?;

      let existing = capture_groups.iter().zip(&group_labels)
        .find(|((g, _), _)| *g == group);
      if let Some((_, label)) = existing {
        return Err(Error::DuplicateCaptureGroup {
          profile: definition.id.clone(),
          name: group_def.name.clone(),
          existing: label.clone()
        });
      }

      capture_groups.push((group, expression));
      group_labels.push(group_def.name.clone());
    }

    let content = ProfileContent {
      id: definition.id.clone(),
      name: definition.name.clone(),
      capture_groups,
      group_labels,
      line_template: definition.line_template.clone(),
      failure_policy: definition.on_failure
    };

    if editable {
      Ok(ParsingProfile::Editable(content))
    } else {
      ParsingProfile::freeze(content)
    }
  }

  pub fn definition(&self) -> ProfileDefinition {
    let content = self.content();

    ProfileDefinition {
      id: content.id.clone(),
      name: content.name.clone(),
      capture_groups: content.capture_groups.iter().zip(&content.group_labels)
        .map(|((group, expression), label)| {
          CaptureGroupDefinition::new(label, group, expression)
        })
        .collect(),
      line_template: content.line_template.clone(),
      on_failure: content.failure_policy
    }
  }

  fn content(&self) -> &ProfileContent {
    match self {
      ParsingProfile::Frozen(frozen) => &frozen.content,
      ParsingProfile::Editable(content) => content
    }
  }

  pub fn id(&self) -> &str {
    &self.content().id
  }

  pub fn name(&self) -> &str {
    &self.content().name
  }

  pub fn capture_groups(&self) -> &[(NamedCaptureGroup, String)] {
    &self.content().capture_groups
  }

  pub fn line_template(&self) -> &str {
    &self.content().line_template
  }

  pub fn failure_policy(&self) -> FailurePolicy {
    self.content().failure_policy
  }

  /// The compiled pattern. Editable profiles recompile on every call, so
  /// edits made since the last call are picked up.
  pub fn pattern(&self) -> Result<Regex> {
    match self {
      ParsingProfile::Frozen(frozen) => Ok(frozen.pattern.clone()),
      ParsingProfile::Editable(content) => content.compile()
    }
  }

  /// The regular expression text the template expands to
  pub fn pattern_string(&self) -> Result<String> {
    let content = self.content();

    build_pattern_string(&content.id, &content.capture_groups, &content.line_template)
  }

  pub fn is_editable(&self) -> bool {
    match self {
      ParsingProfile::Editable(_) => true,
      ParsingProfile::Frozen(_) => false
    }
  }

  pub fn as_editable_mut(&mut self) -> Option<&mut ProfileContent> {
    match self {
      ParsingProfile::Editable(content) => Some(content),
      ParsingProfile::Frozen(_) => None
    }
  }
}

impl PartialEq for ParsingProfile {
  fn eq(&self, other: &ParsingProfile) -> bool {
    self.id() == other.id()
  }
}

impl Eq for ParsingProfile {}

impl Hash for ParsingProfile {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id().hash(state)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::capture::{CaptureGroup, GroupKind, TemporalCaptureGroup};

  fn groups() -> Vec<(NamedCaptureGroup, String)> {
    vec![
      (NamedCaptureGroup::from(TemporalCaptureGroup::Hour), r"\d{2}".to_string()),
      (NamedCaptureGroup::from(CaptureGroup::of("MSG")), r".*".to_string()),
    ]
  }

  #[test]
  fn test_frozen() {
    let profile = ParsingProfile::frozen(
      "hm", "Hour and message", groups(), "^$HOUR $MSG", FailurePolicy::Ignore
    ).unwrap();

    assert_that!(profile.is_editable()).is_false();
    assert_that!(profile.id()).is_equal_to("hm");
    assert_that!(profile.name()).is_equal_to("Hour and message");
    assert_that!(profile.failure_policy()).is_equal_to(FailurePolicy::Ignore);
    assert_that!(profile.pattern().unwrap().is_match("12 hello")).is_true();
  }

  #[test]
  fn test_frozen_unknown_token() {
    let result = ParsingProfile::frozen(
      "bad", "bad", groups(), "^$HOUR $HOST", FailurePolicy::Concat
    );

    match result {
      Err(Error::UnknownCaptureGroup { token, .. }) => {
        assert_that!(token.as_str()).is_equal_to("$HOST")
      },
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_pattern_string_deterministic() {
    let mut reversed = groups();
    reversed.reverse();

    let a = ParsingProfile::editable("a", groups(), "^$HOUR $MSG", FailurePolicy::Concat);
    let b = ParsingProfile::editable("b", reversed, "^$HOUR $MSG", FailurePolicy::Concat);

    assert_that!(a.pattern_string().unwrap()).is_equal_to(b.pattern_string().unwrap());
    assert_that!(a.pattern_string().unwrap()).is_equal_to(a.pattern_string().unwrap());
  }

  #[test]
  fn test_dedupe_groups() {
    let mut duplicated = groups();
    duplicated.push((NamedCaptureGroup::of("hour"), r"\d{1,2}".to_string()));

    let profile = ParsingProfile::editable("d", duplicated, "$HOUR", FailurePolicy::Concat);

    assert_that!(profile.capture_groups().len()).is_equal_to(2);
    assert_that!(profile.capture_groups()[0].1.as_str()).is_equal_to(r"\d{1,2}");
  }

  #[test]
  fn test_editable_recompiles() {
    let mut profile = ParsingProfile::editable("e", groups(), "^$HOUR$", FailurePolicy::Concat);
    assert_that!(profile.pattern().unwrap().is_match("7")).is_false();

    let content = profile.as_editable_mut().unwrap();
    content.insert_capture_group(NamedCaptureGroup::of("HOUR"), r"\d{1,2}");
    assert_that!(profile.pattern().unwrap().is_match("7")).is_true();

    let content = profile.as_editable_mut().unwrap();
    content.set_line_template("^$HOUR $HOST$");
    assert_that!(profile.pattern()).is_err();

    let content = profile.as_editable_mut().unwrap();
    content.insert_capture_group(NamedCaptureGroup::of("HOST"), r"\S+");
    content.set_name("renamed");
    assert_that!(profile.pattern().unwrap().is_match("7 box")).is_true();
    assert_that!(profile.name()).is_equal_to("renamed");
  }

  #[test]
  fn test_frozen_not_editable() {
    let mut profile = BuiltInProfile::Iso.profile().clone();

    assert_that!(profile.as_editable_mut().is_none()).is_true();
  }

  #[test]
  fn test_empty() {
    let profile = ParsingProfile::empty();

    assert_that!(profile.name()).is_equal_to("New profile");
    assert_that!(profile.capture_groups().is_empty()).is_true();
    assert_that!(profile.failure_policy()).is_equal_to(FailurePolicy::Concat);
    assert_that!(profile.is_editable()).is_true();
  }

  #[test]
  fn test_identity() {
    let iso = BuiltInProfile::Iso.profile();
    let editable = iso.to_editable();
    let copy = ParsingProfile::copy_of(iso);

    assert_that!(editable).is_equal_to(iso.clone());
    assert_that!(copy.id()).is_not_equal_to(iso.id());
    assert_that!(copy.name()).is_equal_to("Copy of ISO-like timestamps");
    assert_that!(copy.line_template()).is_equal_to(iso.line_template());
    assert_that!(copy.is_editable()).is_true();
  }

  #[test]
  fn test_to_frozen() {
    let profile = ParsingProfile::editable("f", groups(), "^$HOUR $MSG", FailurePolicy::Concat);
    let frozen = profile.to_frozen().unwrap();

    assert_that!(frozen.is_editable()).is_false();
    assert_that!(frozen).is_equal_to(profile);

    let broken = ParsingProfile::editable("f", groups(), "$NOPE", FailurePolicy::Concat);
    assert_that!(broken.to_frozen()).is_err();
  }

  #[test]
  fn test_definition_round_trip() {
    let original = BuiltInProfile::Syslog.profile();
    let yaml = serde_yaml::to_string(&original.definition()).unwrap();
    let definition: ProfileDefinition = serde_yaml::from_str(&yaml).unwrap();

    let restored = ParsingProfile::from_definition(&definition, false).unwrap();

    assert_that!(restored).is_equal_to(original.clone());
    assert_that!(restored.name()).is_equal_to(original.name());
    assert_that!(restored.line_template()).is_equal_to(original.line_template());
    assert_that!(restored.capture_groups()).is_equal_to(original.capture_groups());
    assert_that!(restored.pattern_string().unwrap())
      .is_equal_to(original.pattern_string().unwrap());
  }

  #[test]
  fn test_from_definition_json() {
    let definition: ProfileDefinition = serde_json::from_str(r#"{
      "id": "custom",
      "name": "Custom",
      "capture_groups": [
        { "name": "hour", "kind": "temporal", "expression": "\\d{2}" },
        { "name": "msg", "expression": ".*" }
      ],
      "line_template": "^$HOUR $MSG",
      "on_failure": "ABORT"
    }"#).unwrap();

    let profile = ParsingProfile::from_definition(&definition, true).unwrap();

    assert_that!(profile.is_editable()).is_true();
    assert_that!(profile.failure_policy()).is_equal_to(FailurePolicy::Abort);
    assert_that!(profile.capture_groups()[0].0.as_temporal())
      .is_equal_to(Some(TemporalCaptureGroup::Hour));
    assert_that!(profile.capture_groups()[1].0.name()).is_equal_to("MSG");
    assert_that!(profile.definition()).is_equal_to(definition);
  }

  fn group_def(name: &str, kind: GroupKind, expression: &str) -> CaptureGroupDefinition {
    CaptureGroupDefinition {
      name: name.to_string(),
      kind,
      expression: expression.to_string()
    }
  }

  fn definition_with(groups: Vec<CaptureGroupDefinition>) -> ProfileDefinition {
    ProfileDefinition {
      id: "names".to_string(),
      name: "Names".to_string(),
      capture_groups: groups,
      line_template: r"^$SECOND\.$MILLI $msg".to_string(),
      on_failure: FailurePolicy::Concat
    }
  }

  #[test]
  fn test_definition_keeps_group_names() {
    let definition = definition_with(vec![
      group_def("second", GroupKind::Temporal, r"\d{2}"),
      group_def("milli", GroupKind::Temporal, r"\d{3}"),
      group_def("msg", GroupKind::Text, r".*"),
    ]);

    for editable in vec![false, true] {
      let profile = ParsingProfile::from_definition(&definition, editable).unwrap();

      assert_that!(profile.definition()).is_equal_to(definition.clone());
      assert_that!(profile.capture_groups()[1].0.as_temporal())
        .is_equal_to(Some(TemporalCaptureGroup::Fraction));
      assert_that!(profile.pattern_string().unwrap().contains("(?P<MSG>.*)")).is_true();

      let copy = ParsingProfile::copy_of(&profile);
      assert_that!(copy.definition().capture_groups).is_equal_to(definition.capture_groups.clone());
    }
  }

  #[test]
  fn test_edits_keep_group_names() {
    let definition = definition_with(vec![
      group_def("second", GroupKind::Temporal, r"\d{2}"),
      group_def("milli", GroupKind::Temporal, r"\d{3}"),
      group_def("msg", GroupKind::Text, r".*"),
    ]);

    let mut profile = ParsingProfile::from_definition(&definition, true).unwrap();
    let content = profile.as_editable_mut().unwrap();
    content.insert_capture_group(NamedCaptureGroup::of("MSG"), r"\S+");
    content.insert_capture_group(NamedCaptureGroup::of("host"), r"\S+");

    let names: Vec<String> = profile.definition().capture_groups.into_iter()
      .map(|g| g.name)
      .collect();
    assert_that!(names).is_equal_to(vec![
      "second".to_string(), "milli".to_string(), "msg".to_string(), "HOST".to_string()
    ]);
    assert_that!(profile.capture_groups()[2].1.as_str()).is_equal_to(r"\S+");
  }

  #[test]
  fn test_definition_rejects_duplicates() {
    let definition = definition_with(vec![
      group_def("milli", GroupKind::Temporal, r"\d{3}"),
      group_def("msg", GroupKind::Text, r".*"),
      group_def("Msg", GroupKind::Text, r"\S+"),
    ]);

    match ParsingProfile::from_definition(&definition, false) {
      Err(Error::DuplicateCaptureGroup { profile, name, existing }) => {
        assert_that!(profile.as_str()).is_equal_to("names");
        assert_that!(name.as_str()).is_equal_to("Msg");
        assert_that!(existing.as_str()).is_equal_to("msg");
      },
      other => panic!("unexpected result: {:?}", other)
    }

    // aliases resolve to the group they stand for
    let definition = definition_with(vec![
      group_def("FRACTION", GroupKind::Temporal, r"\d+"),
      group_def("milli", GroupKind::Temporal, r"\d{3}"),
    ]);
    match ParsingProfile::from_definition(&definition, true) {
      Err(Error::DuplicateCaptureGroup { existing, .. }) => {
        assert_that!(existing.as_str()).is_equal_to("FRACTION")
      },
      other => panic!("unexpected result: {:?}", other)
    }
  }
}
