// ─── Argument Collection ───
// Ordered, key-addressable store for command-line tokens. Insertion order is
// the only order; replace-by-key moves the surviving entry to the end.

use crate::core::error::{LauncherError, LauncherResult};

const SYSTEM_PROPERTY_PREFIX: &str = "-D";

/// A single command-line token plus the key it is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    key: String,
    value: Option<String>,
    raw: String,
}

impl Argument {
    /// Parse a token, deriving its key: `-Dname=value` and `-Dname` are keyed
    /// by `name`, `name=value` by `name`, anything else by the whole token.
    pub fn parse(token: impl Into<String>) -> Self {
        let raw = token.into();
        let (key, value) = match raw.strip_prefix(SYSTEM_PROPERTY_PREFIX) {
            Some(property) => match property.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(value.to_string())),
                None => (property.to_string(), None),
            },
            None => match raw.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    (name.to_string(), Some(value.to_string()))
                }
                _ => (raw.clone(), None),
            },
        };
        Self { key, value, raw }
    }

    /// An argument addressed by an explicit key.
    pub fn keyed(key: impl Into<String>, token: impl Into<String>) -> Self {
        let raw = token.into();
        let value = raw.split_once('=').map(|(_, value)| value.to_string());
        Self {
            key: key.into(),
            value,
            raw,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The exact token placed on the command line.
    pub fn as_command_line_argument(&self) -> &str {
        &self.raw
    }

    pub fn is_system_property(&self) -> bool {
        self.raw.starts_with(SYSTEM_PROPERTY_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentCollection {
    entries: Vec<Argument>,
}

impl ArgumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends unconditionally; repeated tokens are all kept.
    pub fn append(&mut self, token: impl Into<String>) {
        self.entries.push(Argument::parse(token));
    }

    /// Appends under an explicit lookup key.
    pub fn append_keyed(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.entries.push(Argument::keyed(key, token));
    }

    /// Replace-by-key: drops every entry sharing `key`, then appends.
    pub fn set_single(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.replace(Argument::keyed(key, token));
    }

    /// Replace-by-key with the raw form `key=value`.
    pub fn set_value(&mut self, key: &str, value: &str) {
        self.replace(Argument::keyed(key, format!("{key}={value}")));
    }

    /// System properties are single-valued and replace earlier definitions;
    /// every other token is appended.
    pub fn add(&mut self, token: impl Into<String>) {
        let argument = Argument::parse(token);
        if argument.is_system_property() {
            self.replace(argument);
        } else {
            self.entries.push(argument);
        }
    }

    pub fn add_all<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            self.add(token);
        }
    }

    fn replace(&mut self, argument: Argument) {
        self.entries.retain(|entry| entry.key != argument.key);
        self.entries.push(argument);
    }

    /// Raw form of the single entry under `key`. When a key was appended more
    /// than once the most recent entry wins.
    pub fn get(&self, key: &str) -> LauncherResult<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .map(Argument::as_command_line_argument)
            .ok_or_else(|| LauncherError::ArgumentNotFound(key.to_string()))
    }

    /// Value portion of the entry under `key`, if it has one.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .and_then(Argument::value)
    }

    pub fn all_with_key(&self, key: &str) -> Vec<&Argument> {
        self.entries.iter().filter(|entry| entry.key == key).collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Removes every entry under `key`, returning how many were dropped.
    pub fn remove(&mut self, key: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.entries.iter()
    }

    pub fn to_ordered_list(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.raw.clone())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ArgumentCollection {
    fn from_iter<I: IntoIterator<Item = S>>(tokens: I) -> Self {
        let mut collection = Self::new();
        collection.add_all(tokens);
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_derivation() {
        assert_eq!(Argument::parse("-Dkey=value").key(), "key");
        assert_eq!(Argument::parse("-Dkey=value").value(), Some("value"));
        assert_eq!(Argument::parse("-Djava.security.manager").key(), "java.security.manager");
        assert_eq!(Argument::parse("-Djava.security.manager").value(), None);
        assert_eq!(Argument::parse("name=value").key(), "name");
        assert_eq!(Argument::parse("-Xmx512m").key(), "-Xmx512m");
        assert_eq!(Argument::parse("--add-opens").key(), "--add-opens");
    }

    #[test]
    fn mixed_insertions() {
        let mut arguments = ArgumentCollection::new();
        arguments.add("-Dkey=value");
        arguments.add("-X");
        arguments.add("-X");
        arguments.set_value("single-key", "single-value");
        arguments.set_value("single-key", "single-value");
        arguments.add_all(["-Dprop1=value1", "-Dprop2=value2", "-Dprop3=value3"]);

        let keyed = arguments.all_with_key("key");
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed[0].as_command_line_argument(), "-Dkey=value");
        assert_eq!(arguments.value_of("key"), Some("value"));

        assert_eq!(arguments.all_with_key("-X").len(), 2);
        assert_eq!(arguments.all_with_key("single-key").len(), 1);

        let list = arguments.to_ordered_list();
        assert_eq!(
            list,
            vec![
                "-Dkey=value",
                "-X",
                "-X",
                "single-key=single-value",
                "-Dprop1=value1",
                "-Dprop2=value2",
                "-Dprop3=value3",
            ]
        );
    }

    #[test]
    fn set_single_is_last_write_wins() {
        let mut arguments = ArgumentCollection::new();
        arguments.set_single("--install-dir", "--install-dir=/foo");
        arguments.set_single("--install-dir", "--install-dir=/bar");

        assert_eq!(arguments.all_with_key("--install-dir").len(), 1);
        assert_eq!(arguments.get("--install-dir").unwrap(), "--install-dir=/bar");
    }

    #[test]
    fn append_keeps_duplicates_in_order() {
        let mut arguments = ArgumentCollection::new();
        arguments.append_keyed("--yaml", "--yaml=/a.yml");
        arguments.append_keyed("--yaml", "--yaml=/b.yml");

        let all = arguments.all_with_key("--yaml");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].as_command_line_argument(), "--yaml=/a.yml");
        assert_eq!(all[1].as_command_line_argument(), "--yaml=/b.yml");
    }

    #[test]
    fn replace_moves_entry_to_the_end() {
        let mut arguments = ArgumentCollection::new();
        arguments.add("-Da=1");
        arguments.add("-Db=2");
        arguments.add("-Da=3");
        assert_eq!(arguments.to_ordered_list(), vec!["-Db=2", "-Da=3"]);
    }

    #[test]
    fn missing_key_is_reported() {
        let arguments = ArgumentCollection::new();
        assert!(matches!(
            arguments.get("nope"),
            Err(LauncherError::ArgumentNotFound(key)) if key == "nope"
        ));
        assert_eq!(arguments.value_of("nope"), None);
    }

    #[test]
    fn remove_drops_every_entry_for_key() {
        let mut arguments: ArgumentCollection = ["-X", "-Y", "-X"].into_iter().collect();
        assert_eq!(arguments.remove("-X"), 2);
        assert_eq!(arguments.to_ordered_list(), vec!["-Y"]);
        assert!(!arguments.contains_key("-X"));
    }
}
