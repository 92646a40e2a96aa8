//! Flat placeholder substitution for subjects and bodies.
//!
//! Supported placeholders: `{{first_name}}`, `{{last_name}}`, `{{email}}`,
//! `{{country}}`. Anything else between `{{` and `}}` is removed so a typo
//! in a template never leaks braces into a delivered email.

use drover_core::{
  campaign::{Campaign, Template},
  contact::ContactSnapshot,
};

const FALLBACK_SUBJECT: &str = "Campaign";
const FALLBACK_BODY: &str = "<p>No content</p>";

/// Subject resolution: campaign override, then template, then a fixed
/// fallback. Blank strings count as unset.
pub fn resolve_subject(campaign: &Campaign, template: &Template) -> String {
  nonblank(campaign.subject_line.as_deref())
    .or_else(|| nonblank(template.subject_line.as_deref()))
    .unwrap_or(FALLBACK_SUBJECT)
    .to_owned()
}

/// Body resolution: the template's HTML, or a minimal placeholder body.
pub fn resolve_body(template: &Template) -> String {
  nonblank(template.content_html.as_deref())
    .unwrap_or(FALLBACK_BODY)
    .to_owned()
}

fn nonblank(value: Option<&str>) -> Option<&str> {
  value.filter(|s| !s.trim().is_empty())
}

/// Substitute known placeholders with the recipient's fields and strip any
/// unrecognized `{{…}}` token.
pub fn render_placeholders(input: &str, snapshot: &ContactSnapshot) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(start) = rest.find("{{") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    match after.find("}}") {
      Some(end) => {
        match after[..end].trim() {
          "first_name" => out.push_str(&snapshot.first_name),
          "last_name" => out.push_str(&snapshot.last_name),
          "email" => out.push_str(&snapshot.email),
          "country" => out.push_str(&snapshot.country),
          _ => {} // unknown placeholder: drop it
        }
        rest = &after[end + 2..];
      }
      // Unterminated `{{`: keep the literal text.
      None => {
        out.push_str(&rest[start..]);
        return out;
      }
    }
  }

  out.push_str(rest);
  out
}
