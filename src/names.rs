use std::collections::BTreeMap;

// Normalization happens exactly once, here; every later lookup must go
// through fold() so it matches what the dedup pass stored.
pub fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn fold(name: &str) -> String {
    normalize(name).to_lowercase()
}

#[derive(Debug, Default)]
pub struct NameSet {
    entries: BTreeMap<String, String>,
}

impl NameSet {
    pub fn insert(&mut self, raw: &str) {
        let display = normalize(raw);
        if display.is_empty() {
            return;
        }
        self.entries.entry(display.to_lowercase()).or_insert(display);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Lexicographic by folded key, so repeated imports of the same input
    // assign the same generated ids.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, display)| (key.as_str(), display.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  Science   Fiction "), "Science Fiction");
        assert_eq!(fold(" Science  Fiction"), "science fiction");
    }

    #[test]
    fn dedups_case_insensitively_keeping_first_spelling() {
        let mut set = NameSet::default();
        set.insert("Drama");
        set.insert("DRAMA");
        set.insert(" drama ");
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap(), ("drama", "Drama"));
    }

    #[test]
    fn iterates_in_lexicographic_key_order() {
        let mut set = NameSet::default();
        set.insert("Western");
        set.insert("Action");
        set.insert("Drama");
        let keys: Vec<&str> = set.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["action", "drama", "western"]);
    }

    #[test]
    fn ignores_blank_names() {
        let mut set = NameSet::default();
        set.insert("   ");
        set.insert("");
        assert!(set.is_empty());
    }
}
