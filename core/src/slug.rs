// florist/src/slug.rs

/// URL slug for product and category names, folding Turkish letters to ASCII.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  let mut pending_dash = false;
  for ch in name.chars() {
    let folded = match ch {
      'ç' | 'Ç' => Some('c'),
      'ğ' | 'Ğ' => Some('g'),
      'ı' | 'I' | 'İ' | 'i' => Some('i'),
      'ö' | 'Ö' => Some('o'),
      'ş' | 'Ş' => Some('s'),
      'ü' | 'Ü' => Some('u'),
      c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
      _ => None,
    };
    match folded {
      Some(c) => {
        if pending_dash && !slug.is_empty() {
          slug.push('-');
        }
        pending_dash = false;
        slug.push(c);
      }
      None => pending_dash = true,
    }
  }
  slug
}

#[cfg(test)]
mod tests {
  use super::slugify;

  #[test]
  fn folds_turkish_letters_and_collapses_separators() {
    assert_eq!(slugify("Kırmızı Güller & Şakayık"), "kirmizi-guller-sakayik");
    assert_eq!(slugify("  Özel   Gün  "), "ozel-gun");
    assert_eq!(slugify("ÇİÇEK"), "cicek");
  }
}
