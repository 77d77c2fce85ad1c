use crate::error::{Error, Result};

/// Ordered, non-empty list of shell commands run on every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet(Vec<String>);

impl CommandSet {
    pub fn new<I, S>(commands: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        if commands.is_empty() {
            return Err(Error::EmptyCommandSet);
        }
        Ok(Self(commands))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declared_order() {
        let commands = CommandSet::new(["ls", "pwd", "uptime"]).unwrap();
        assert_eq!(commands.iter().collect::<Vec<_>>(), vec!["ls", "pwd", "uptime"]);
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn refuses_an_empty_list() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(CommandSet::new(empty), Err(Error::EmptyCommandSet)));
    }
}
