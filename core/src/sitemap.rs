// florist/src/sitemap.rs
use chrono::{DateTime, Utc};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
  Daily,
  Weekly,
  Monthly,
}

impl ChangeFreq {
  fn as_str(self) -> &'static str {
    match self {
      ChangeFreq::Daily => "daily",
      ChangeFreq::Weekly => "weekly",
      ChangeFreq::Monthly => "monthly",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
  /// Site-relative path, e.g. `/urun/kirmizi-gul-buketi`.
  pub path: String,
  pub last_modified: Option<DateTime<Utc>>,
  pub change_freq: ChangeFreq,
  pub priority: f32,
}

impl SitemapEntry {
  pub fn new(path: impl Into<String>, change_freq: ChangeFreq, priority: f32) -> Self {
    Self {
      path: path.into(),
      last_modified: None,
      change_freq,
      priority,
    }
  }

  pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
    self.last_modified = Some(at);
    self
  }
}

fn escape_xml(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for ch in raw.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Renders a sitemaps.org `urlset` document.
pub fn render_sitemap(base_url: &str, entries: &[SitemapEntry]) -> String {
  let base = base_url.trim_end_matches('/');
  let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
  xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
  for entry in entries {
    let path = if entry.path.starts_with('/') {
      entry.path.clone()
    } else {
      format!("/{}", entry.path)
    };
    // Writing into a String is infallible.
    let _ = write!(xml, "  <url>\n    <loc>{}</loc>\n", escape_xml(&format!("{}{}", base, path)));
    if let Some(at) = entry.last_modified {
      let _ = writeln!(xml, "    <lastmod>{}</lastmod>", at.format("%Y-%m-%d"));
    }
    let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.change_freq.as_str());
    let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority.clamp(0.0, 1.0));
    xml.push_str("  </url>\n");
  }
  xml.push_str("</urlset>\n");
  xml
}
