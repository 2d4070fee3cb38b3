// tests/storefront_helpers_tests.rs
mod common;

use common::*;
use florist::sitemap::{render_sitemap, ChangeFreq, SitemapEntry};
use florist::VoteThrottle;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[test]
fn vote_throttle_blocks_repeat_votes_within_window() {
  let throttle = VoteThrottle::new(Duration::from_secs(60));
  let review = Uuid::new_v4();
  let start = Instant::now();

  assert!(throttle.try_register(review, "10.0.0.1", start));
  assert!(!throttle.try_register(review, "10.0.0.1", start + Duration::from_secs(59)));
  assert!(throttle.try_register(review, "10.0.0.2", start), "voters are tracked separately");
  assert!(throttle.try_register(Uuid::new_v4(), "10.0.0.1", start), "reviews are tracked separately");
  assert!(throttle.try_register(review, "10.0.0.1", start + Duration::from_secs(60)));
  assert_eq!(throttle.tracked(), 3);
}

#[test]
fn sitemap_lists_absolute_escaped_urls() {
  let entries = vec![
    SitemapEntry::new("/", ChangeFreq::Daily, 1.0),
    SitemapEntry::new("urun/gul&papatya", ChangeFreq::Weekly, 0.8).modified_at(utc(2025, 3, 13, 9, 0)),
  ];
  let xml = render_sitemap("https://cicek.example.com/", &entries);

  assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
  assert!(xml.contains("<loc>https://cicek.example.com/</loc>"));
  assert!(xml.contains("<loc>https://cicek.example.com/urun/gul&amp;papatya</loc>"));
  assert!(xml.contains("<lastmod>2025-03-13</lastmod>"));
  assert!(xml.contains("<changefreq>weekly</changefreq>"));
  assert!(xml.contains("<priority>0.8</priority>"));
  assert_eq!(xml.matches("<url>").count(), 2);
}
