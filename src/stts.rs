//! The closed POS-tag inventory (STTS), each tag with one representative
//! German word. The correction search inserts these words when it needs a
//! token of a particular tag.

/// (tag, representative word)
pub const INVENTORY: &[(&str, &str)] = &[
  ("NN", "Tisch"),
  ("NE", "Hans"),
  ("ADJA", "große"),
  ("ADJD", "schnell"),
  ("CARD", "zwei"),
  ("VMFIN", "dürfen"),
  ("VAFIN", "bist"),
  ("VVFIN", "gehst"),
  ("VAIMP", "sei"),
  ("VVIMP", "komm"),
  ("VVINF", "gehen"),
  ("VAINF", "werden"),
  ("VMINF", "wollen"),
  ("VVIZU", "anzukommen"),
  ("VVPP", "gegangen"),
  ("VMPP", "gekonnt"),
  ("VAPP", "gewesen"),
  ("ART", "der"),
  ("PPER", "ich"),
  ("PRF", "sich"),
  ("PPOSAT", "mein"),
  ("PPOSS", "meins"),
  ("PDAT", "jener"),
  ("PDS", "dieser"),
  ("PIAT", "kein"),
  ("PIDAT", "wenig"),
  ("PIS", "keiner"),
  ("PRELAT", "dessen"),
  ("PRELS", "der"),
  ("PWAT", "welche"),
  ("PWS", "wer"),
  ("PWAV", "warum"),
  ("PAV", "dafür"),
  ("ADV", "schon"),
  ("KOUI", "um"),
  ("KOUS", "weil"),
  ("KON", "und"),
  ("KOKOM", "als"),
  ("APPR", "in"),
  ("APPRART", "im"),
  ("APPO", "zufolge"),
  ("APZR", "an"),
  ("PTKZU", "zu"),
  ("PTKNEG", "nicht"),
  ("PTKVZ", "an"),
  ("PTKA", "am"),
  ("PTKANT", "ja"),
  ("ITJ", "mhm"),
  ("TRUNC", "An-"),
  ("XY", "H2O"),
  ("FM", "Fish"),
  ("$,", ","),
  ("$.", "."),
];

/// Sentence-final punctuation tag
pub const SENTENCE_END: &str = "$.";

pub fn contains_tag(tag: &str) -> bool {
  INVENTORY.iter().any(|(t, _)| *t == tag)
}

pub fn word_for_tag(tag: &str) -> Option<&'static str> {
  INVENTORY.iter().find(|(t, _)| *t == tag).map(|(_, w)| *w)
}

pub fn tags() -> impl Iterator<Item = &'static str> {
  INVENTORY.iter().map(|(t, _)| *t)
}

#[test]
fn test_inventory_lookup() {
  assert!(contains_tag("ART"));
  assert!(contains_tag("$."));
  assert!(!contains_tag("NP"));
  assert_eq!(word_for_tag("VVFIN"), Some("gehst"));
  assert_eq!(word_for_tag("S"), None);
  assert_eq!(tags().count(), INVENTORY.len());
}
