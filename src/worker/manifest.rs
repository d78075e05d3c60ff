//! Static install manifest and request URL patterns.

use url::Url;

/// Cache namespace prefix shared by every cache version.
pub const CACHE_PREFIX: &str = "resto-revs";

/// Current cache version. Bumping this starts a disjoint namespace;
/// the superseded one is purged at activation.
pub const CACHE_VERSION: &str = "v0001";

/// Document served in place of a detail page that cannot be reached.
pub const FALLBACK_PAGE: &str = "unavailable.html";

/// Filename of the restaurant detail page.
pub const DETAIL_PAGE: &str = "restaurant.html";

/// Size-variant suffixes of every catalog photo.
pub const PHOTO_SUFFIXES: &[&str] = &["", "-200", "-300", "-400", "-500", "-600"];

/// Ids of the photos shipped with the application shell.
const PHOTO_IDS: std::ops::RangeInclusive<i64> = 1..=10;

/// Application shell resources, cached as-is at install time.
const APP_SHELL: &[&str] = &[
  "index.html",
  "restaurant.html",
  "unavailable.html",
  "data/restaurants.json",
  "img/restaurant-128.png",
  "img/restaurant-256.png",
  "img/restaurant.png",
  "img/image-not-found.jpg",
  "css/styles.css",
  "css/styles.min.css",
  "js/urlhelper.js",
  "js/urlhelper.min.js",
  "js/dbhelper.js",
  "js/dbhelper.min.js",
  "js/main.js",
  "js/main.min.js",
  "js/restaurant_info.js",
  "js/restaurant_info.min.js",
];

/// Name of the cache namespace for the current version.
pub fn cache_name() -> String {
  format!("{}-{}", CACHE_PREFIX, CACHE_VERSION)
}

/// The full install manifest: the application shell plus every photo
/// size variant, as URLs relative to the site root.
pub fn build_manifest() -> Vec<String> {
  let mut entries: Vec<String> = APP_SHELL.iter().map(|s| s.to_string()).collect();

  for id in PHOTO_IDS {
    for suffix in PHOTO_SUFFIXES {
      entries.push(format!("img/{}{}.jpg", id, suffix));
    }
  }

  entries
}

/// Absolute URL of the detail page for a restaurant id.
pub fn detail_page_url(base: &Url, id: i64) -> Result<Url, url::ParseError> {
  base.join(&format!("{}?id={}", DETAIL_PAGE, id))
}

/// Whether a request targets a restaurant detail page: the detail-page
/// filename with an `id` query parameter. Only such requests are
/// eligible for fallback substitution.
pub fn is_detail_page(url: &Url) -> bool {
  url.path().ends_with(DETAIL_PAGE) && url.query_pairs().any(|(k, _)| k == "id")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_manifest_contains_shell_and_photo_variants() {
    let manifest = build_manifest();

    assert!(manifest.contains(&"index.html".to_string()));
    assert!(manifest.contains(&FALLBACK_PAGE.to_string()));
    assert!(manifest.contains(&"img/image-not-found.jpg".to_string()));
    assert!(manifest.contains(&"img/1.jpg".to_string()));
    assert!(manifest.contains(&"img/10-600.jpg".to_string()));

    // 10 photo ids at 6 size tiers each, on top of the shell
    assert_eq!(manifest.len(), APP_SHELL.len() + 10 * 6);
  }

  #[test]
  fn test_manifest_has_no_duplicate_keys() {
    let manifest = build_manifest();
    let unique: std::collections::HashSet<&String> = manifest.iter().collect();
    assert_eq!(unique.len(), manifest.len());
  }

  #[test]
  fn test_detail_page_url() {
    let base = Url::parse("http://localhost:8000/").unwrap();
    let url = detail_page_url(&base, 7).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8000/restaurant.html?id=7");
  }

  #[test]
  fn test_is_detail_page() {
    let detail = Url::parse("http://localhost:8000/restaurant.html?id=7").unwrap();
    assert!(is_detail_page(&detail));

    let no_id = Url::parse("http://localhost:8000/restaurant.html").unwrap();
    assert!(!is_detail_page(&no_id));

    let other = Url::parse("http://localhost:8000/index.html?id=7").unwrap();
    assert!(!is_detail_page(&other));
  }
}
